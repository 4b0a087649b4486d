//! Operator adjustments, fleet-wide counts and remote signals.

use crate::prelude::*;
use pb_core::{keys::WORKER_COUNT_KEY, JobId};
use pb_engine::admin::{
    adjust_scheduled_workers, running_workers, scheduled_workers, send_signal, Adjustment,
};
use pb_engine::{FakeSignals, JobRegistry, Manager};
use pb_store::{Command, MemoryStore, Store};

async fn stored(store: &MemoryStore) -> Option<String> {
    store
        .exec(Command::hget(WORKER_COUNT_KEY, JOB))
        .await
        .unwrap()
        .into_opt_string()
        .unwrap()
}

#[tokio::test]
async fn relative_adjustments_apply_only_their_deltas() {
    let store = MemoryStore::new();
    let job = JobId::new(JOB);
    assert_eq!(stored(&store).await, None);

    adjust_scheduled_workers(&store, &job, Adjustment::To(2)).await.unwrap();
    assert_eq!(adjust_scheduled_workers(&store, &job, Adjustment::By(3)).await.unwrap(), 5);
    assert_eq!(stored(&store).await.as_deref(), Some("5"));
    assert_eq!(adjust_scheduled_workers(&store, &job, Adjustment::By(-1)).await.unwrap(), 4);
    assert_eq!(stored(&store).await.as_deref(), Some("4"));
    assert_eq!(scheduled_workers(&store, &job).await.unwrap(), 4);
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let store = MemoryStore::new();
    let job = JobId::new(JOB);

    let adds = (0..10).map(|_| {
        let store = store.clone();
        let job = job.clone();
        tokio::spawn(async move { adjust_scheduled_workers(&store, &job, Adjustment::By(1)).await })
    });
    for add in adds.collect::<Vec<_>>() {
        add.await.unwrap().unwrap();
    }

    assert_eq!(stored(&store).await.as_deref(), Some("10"));
}

#[tokio::test]
async fn running_count_sums_the_fleet() {
    let store = MemoryStore::new();
    set_desired(&store, 4).await;
    let p0 = process(&store, "p0");
    let p1 = process(&store, "p1");
    p0.try_heartbeat().await.unwrap();
    p1.try_heartbeat().await.unwrap();
    p0.try_heartbeat().await.unwrap();

    assert_eq!(running_workers(&store, &JobId::new(JOB)).await.unwrap(), 4);

    p1.stop().await;
    p0.try_heartbeat().await.unwrap();
    assert_eq!(running_workers(&store, &JobId::new(JOB)).await.unwrap(), 4);

    p0.stop().await;
}

#[tokio::test]
async fn remote_signal_reaches_only_its_target() {
    let store = MemoryStore::new();
    let build = |name: &str, signals: &FakeSignals| {
        Manager::builder(store.clone(), JobRegistry::new(), Default::default())
            .identity(pb_core::Identity::new(name))
            .signals(signals.clone())
            .build()
            .unwrap()
    };
    let (s0, s1) = (FakeSignals::new(), FakeSignals::new());
    let p0 = build("p0", &s0);
    let p1 = build("p1", &s1);

    send_signal(&store, p1.identity(), "SIGUSR1").await.unwrap();
    p0.try_heartbeat().await.unwrap();
    p1.try_heartbeat().await.unwrap();

    assert!(s0.delivered().is_empty());
    assert_eq!(s1.delivered(), vec!["USR1"]);
}
