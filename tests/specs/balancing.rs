//! Slot ownership across peer processes.

use crate::prelude::*;
use pb_core::{Membership, WorkerStats};
use pb_store::{MemoryStore, Store};

#[tokio::test]
async fn single_process_runs_slot_zero() {
    let store = MemoryStore::new();
    set_desired(&store, 1).await;
    let p = process(&store, "p0");

    p.try_heartbeat().await.unwrap();

    assert_eq!(p.membership(), Membership::new(Some(0), 1));
    assert_eq!(running(&p), vec![0]);
    p.stop().await;
}

#[tokio::test]
async fn unset_count_defaults_to_one_worker() {
    let store = MemoryStore::new();
    let p = process(&store, "p0");

    p.try_heartbeat().await.unwrap();

    assert_eq!(running(&p), vec![0]);
    p.stop().await;
}

#[tokio::test]
async fn two_processes_split_four_slots() {
    let store = MemoryStore::new();
    set_desired(&store, 4).await;
    let p0 = process(&store, "p0");
    let p1 = process(&store, "p1");

    p0.try_heartbeat().await.unwrap();
    p1.try_heartbeat().await.unwrap();
    p0.try_heartbeat().await.unwrap();

    assert_eq!(p0.membership(), Membership::new(Some(0), 2));
    assert_eq!(p1.membership(), Membership::new(Some(1), 2));
    assert_eq!(running(&p0), vec![0, 2]);
    assert_eq!(running(&p1), vec![1, 3]);

    // p0 alone briefly owned every slot; those extras drain away
    beat_until(&p0, || stopping(&p0).is_empty()).await;
    assert_eq!(running(&p0), vec![0, 2]);

    p0.stop().await;
    p1.stop().await;
}

#[tokio::test]
async fn shrinking_count_stops_extra_slots_and_reaps_them() {
    let store = MemoryStore::new();
    set_desired(&store, 4).await;
    let p = process(&store, "p0");
    p.try_heartbeat().await.unwrap();
    assert_eq!(running(&p), vec![0, 1, 2, 3]);

    set_desired(&store, 1).await;
    p.try_heartbeat().await.unwrap();

    assert_eq!(running(&p), vec![0]);
    assert_eq!(stopping(&p), vec![1, 2, 3]);

    beat_until(&p, || stopping(&p).is_empty()).await;
    assert_eq!(running(&p), vec![0]);
    p.stop().await;
}

#[tokio::test]
async fn leaving_peer_hands_its_slots_back() {
    let store = MemoryStore::new();
    set_desired(&store, 2).await;
    let p0 = process(&store, "p0");
    let p1 = process(&store, "p1");

    p0.try_heartbeat().await.unwrap();
    p1.try_heartbeat().await.unwrap();
    p0.try_heartbeat().await.unwrap();
    assert_eq!(running(&p0), vec![0]);
    assert_eq!(running(&p1), vec![1]);

    p1.stop().await;
    p0.try_heartbeat().await.unwrap();

    assert_eq!(p0.membership(), Membership::new(Some(0), 1));
    assert_eq!(running(&p0), vec![0, 1]);
    p0.stop().await;
}

#[tokio::test]
async fn published_stats_describe_each_process() {
    let store = MemoryStore::new();
    set_desired(&store, 3).await;
    let p0 = process(&store, "p0");
    let p1 = process(&store, "p1");
    p0.try_heartbeat().await.unwrap();
    p1.try_heartbeat().await.unwrap();
    beat_until(&p0, || stopping(&p0).is_empty()).await;

    let published = store
        .exec(pb_store::Command::hget(pb_core::keys::workers("p1"), JOB))
        .await
        .unwrap()
        .into_opt_string()
        .unwrap()
        .unwrap();
    let stats: WorkerStats = serde_json::from_str(&published).unwrap();
    assert_eq!(stats.running_ids(), vec![pb_core::SlotId(1)]);
    assert_eq!(running(&p0), vec![0, 2]);

    p0.stop().await;
    p1.stop().await;
}

#[tokio::test]
async fn apps_in_separate_namespaces_balance_independently() {
    let store = MemoryStore::new();
    let app = |namespace: &str, name: &str| {
        let config = pb_core::Config {
            jobs: vec![pb_core::JobConfig::new(JOB, "Looping")],
            ..pb_core::Config::default()
        };
        pb_engine::Manager::builder(
            pb_store::NamespacedStore::new(store.clone(), namespace),
            registry(&LedgerLog::default()),
            config,
        )
        .identity(pb_core::Identity::new(name))
        .signals(pb_engine::FakeSignals::new())
        .build()
        .unwrap()
    };
    let billing = app("billing", "p0");
    let search = app("search", "p0");

    billing.try_heartbeat().await.unwrap();
    search.try_heartbeat().await.unwrap();

    assert_eq!(billing.membership(), Membership::new(Some(0), 1));
    assert_eq!(search.membership(), Membership::new(Some(0), 1));
    let members = store
        .exec(pb_store::Command::lrange("billing:processes"))
        .await
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(members, vec!["p0"]);
    let bare = store.exec(pb_store::Command::exists("p0")).await.unwrap();
    assert_eq!(bare.into_int().unwrap(), 0);
    let scoped = store.exec(pb_store::Command::exists("search:p0")).await.unwrap();
    assert_eq!(scoped.into_int().unwrap(), 1);

    billing.stop().await;
    search.stop().await;
}
