// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::MemoryStore;

async fn list(store: &MemoryStore, key: &str) -> Vec<String> {
    store.exec(Command::lrange(key)).await.unwrap().into_list().unwrap()
}

#[tokio::test]
async fn keys_are_prefixed_with_namespace() {
    let raw = MemoryStore::new();
    let store = NamespacedStore::new(raw.clone(), "billing");

    store.exec(Command::rpush("processes", "a")).await.unwrap();
    store
        .multi(vec![Command::hincrby("worker_counts", "sync", 2)])
        .await
        .unwrap();

    assert_eq!(list(&raw, "billing:processes").await, vec!["a"]);
    assert!(list(&raw, "processes").await.is_empty());
    assert_eq!(
        raw.exec(Command::hget("billing:worker_counts", "sync")).await.unwrap(),
        Reply::Bulk("2".into())
    );
    assert_eq!(
        store.exec(Command::hget("worker_counts", "sync")).await.unwrap(),
        Reply::Bulk("2".into())
    );
}

#[tokio::test]
async fn namespaces_do_not_collide() {
    let raw = MemoryStore::new();
    let billing = NamespacedStore::new(raw.clone(), "billing");
    let search = NamespacedStore::new(raw.clone(), "search");

    billing.exec(Command::rpush("processes", "a")).await.unwrap();
    search.exec(Command::rpush("processes", "b")).await.unwrap();

    let members = billing.exec(Command::lrange("processes")).await.unwrap();
    assert_eq!(members.into_list().unwrap(), vec!["a"]);
    let members = search.exec(Command::lrange("processes")).await.unwrap();
    assert_eq!(members.into_list().unwrap(), vec!["b"]);
}

#[tokio::test]
async fn watch_covers_the_prefixed_key() {
    let raw = MemoryStore::new();
    let store = NamespacedStore::new(raw.clone(), "billing");
    let other = NamespacedStore::new(raw.clone(), "search");

    let mut watch = store.watch("processes").await.unwrap();
    assert_eq!(watch.exec(Command::lrange("processes")).await.unwrap(), Reply::List(vec![]));
    other.exec(Command::rpush("processes", "x")).await.unwrap();
    assert!(watch
        .commit(vec![Command::rpush("processes", "a")])
        .await
        .unwrap()
        .is_some());
    assert_eq!(list(&raw, "billing:processes").await, vec!["a"]);

    let watch = store.watch("processes").await.unwrap();
    raw.exec(Command::rpush("billing:processes", "rival")).await.unwrap();
    assert_eq!(
        watch.commit(vec![Command::rpush("processes", "b")]).await.unwrap(),
        None
    );
    assert_eq!(list(&raw, "billing:processes").await, vec!["a", "rival"]);
}

#[tokio::test]
async fn empty_namespace_passes_keys_through() {
    let raw = MemoryStore::new();
    let store = NamespacedStore::new(raw.clone(), "");

    store.exec(Command::rpush("processes", "a")).await.unwrap();

    assert_eq!(list(&raw, "processes").await, vec!["a"]);
}
