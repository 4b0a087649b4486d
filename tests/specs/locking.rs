//! Worker locks under contention.

use crate::prelude::*;
use pb_core::{Identity, JobId, SlotId};
use pb_engine::{LockStrategy, StoreLock};
use pb_store::MemoryStore;
use std::time::Duration;

fn target() -> pb_engine::LockTarget {
    pb_engine::LockTarget::new(JobId::new(JOB), SlotId(0), Duration::from_secs(30))
}

fn holder(store: &MemoryStore, name: &str, timeout_ms: u64) -> StoreLock<MemoryStore> {
    StoreLock::new(store.clone(), Identity::new(name)).with_timeout(Duration::from_millis(timeout_ms))
}

#[tokio::test(start_paused = true)]
async fn racing_holders_never_both_acquire() {
    let store = MemoryStore::new();
    let a = holder(&store, "a", 200);
    let b = holder(&store, "b", 200);
    let t = target();

    let (ra, rb) = tokio::join!(a.acquire(&t), b.acquire(&t));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert!(ra.is_some() ^ rb.is_some());
    let winner = if ra.is_some() { "a" } else { "b" };
    assert_eq!(get(&store, "lock_sync_0").await.as_deref(), Some(winner));
}

#[tokio::test(start_paused = true)]
async fn waiter_acquires_once_holder_releases() {
    let store = MemoryStore::new();
    let a = holder(&store, "a", 200);
    let b = holder(&store, "b", 1000);
    let t = target();

    let mut held = a.acquire(&t).await.unwrap().unwrap();
    let waiter = {
        let t = t.clone();
        tokio::spawn(async move { b.acquire(&t).await.map(|h| h.is_some()) })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    held.release().await.unwrap();

    assert!(waiter.await.unwrap().unwrap());
    assert_eq!(get(&store, "lock_sync_0").await.as_deref(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn waiter_gives_up_after_its_timeout() {
    let store = MemoryStore::new();
    let a = holder(&store, "a", 200);
    let b = holder(&store, "b", 200);
    let t = target();

    let _held = a.acquire(&t).await.unwrap().unwrap();
    let started = tokio::time::Instant::now();

    assert!(b.acquire(&t).await.unwrap().is_none());
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(get(&store, "lock_sync_0").await.as_deref(), Some("a"));
}

#[tokio::test]
async fn batch_job_runs_under_store_lock_and_releases_it() {
    let store = MemoryStore::new();
    let log = LedgerLog::default();
    let p = ledger_process(&store, "p0", &log);

    p.try_heartbeat().await.unwrap();
    wait_for(|| log.lock().len() >= 4).await;
    p.stop().await;

    let processed = log.lock().clone();
    assert!(processed.iter().all(|(slot, _)| *slot == SlotId(0)));
    assert_eq!(processed[..4].iter().map(|(_, r)| *r).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert_eq!(get(&store, "lock_sync_0").await, None);
}
