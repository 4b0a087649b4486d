// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::JobError;
use crate::job::Job;
use async_trait::async_trait;
use pb_core::Directive;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Job that loops until cancelled, optionally failing on its first perform.
struct Looping {
    fail_first: bool,
}

#[async_trait]
impl Job for Looping {
    async fn perform(&mut self) -> Result<Directive, JobError> {
        if std::mem::take(&mut self.fail_first) {
            return Err(JobError::Failed("first perform fails".into()));
        }
        Ok(Directive::Sleep(Duration::from_millis(5)))
    }
}

fn factory(builds: &Arc<AtomicU32>, fail_first: bool) -> JobFactory {
    let builds = Arc::clone(builds);
    Arc::new(move |_init: JobInit| -> Result<Box<dyn Job>, JobError> {
        builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Looping { fail_first }))
    })
}

fn watcher(capacity: u32, factory: JobFactory) -> Watcher {
    Watcher::new(
        JobConfig::new("sync", "Looping"),
        factory,
        None,
        WorkerPool::new(capacity),
    )
}

fn slots(ids: &[u32]) -> Vec<SlotId> {
    ids.iter().copied().map(SlotId).collect()
}

/// Wait until every stopping worker's run loop has ended.
async fn drain(watcher: &Watcher) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !watcher.state.lock().stopping.iter().all(Worker::is_stopped) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn starts_owned_slots_for_index() {
    let builds = Arc::new(AtomicU32::new(0));
    let w0 = watcher(10, factory(&builds, false));
    let w1 = watcher(10, factory(&builds, false));

    let out0 = w0.reconcile(Membership::new(Some(0), 2), 4);
    let out1 = w1.reconcile(Membership::new(Some(1), 2), 4);

    assert_eq!(out0.started, slots(&[0, 2]));
    assert_eq!(out1.started, slots(&[1, 3]));
    assert_eq!(w0.stats(), WorkerStats::new(slots(&[0, 2]), slots(&[])));
    assert_eq!(builds.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn unchanged_assignment_touches_nothing() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(10, factory(&builds, false));

    w.reconcile(Membership::new(Some(0), 1), 2);
    let again = w.reconcile(Membership::new(Some(0), 1), 2);

    assert_eq!(again, ReconcileOutcome::default());
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shrinking_stops_extra_slots_then_reaps_them() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(10, factory(&builds, false));
    let solo = Membership::new(Some(0), 1);

    w.reconcile(solo, 4);
    let shrink = w.reconcile(solo, 1);
    assert_eq!(shrink.stopped, slots(&[1, 2, 3]));
    assert!(shrink.started.is_empty());
    assert_eq!(w.running_slots(), slots(&[0]).into_iter().collect());
    assert_eq!(w.stats(), WorkerStats::new(slots(&[0]), slots(&[1, 2, 3])));

    drain(&w).await;
    let reap = w.reconcile(solo, 1);
    assert_eq!(reap.reaped, slots(&[1, 2, 3]));
    assert_eq!(w.stats(), WorkerStats::new(slots(&[0]), slots(&[])));
}

#[tokio::test]
async fn no_index_owns_nothing() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(10, factory(&builds, false));

    w.reconcile(Membership::new(Some(0), 1), 2);
    let lost = w.reconcile(Membership::new(None, 3), 2);

    assert_eq!(lost.stopped, slots(&[0, 1]));
    assert!(w.running_slots().is_empty());
}

#[tokio::test]
async fn zero_peers_owns_nothing() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(10, factory(&builds, false));

    let out = w.reconcile(Membership::new(Some(0), 0), 5);
    assert_eq!(out, ReconcileOutcome::default());
}

#[tokio::test]
async fn failed_worker_is_reaped_and_restarted() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(10, factory(&builds, true));
    let solo = Membership::new(Some(0), 1);

    w.reconcile(solo, 1);
    tokio::time::timeout(Duration::from_secs(5), async {
        while w.state.lock().running.values().any(Worker::is_running) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    let restart = w.reconcile(solo, 1);
    assert_eq!(restart.reaped, slots(&[0]));
    assert_eq!(restart.started, slots(&[0]));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn saturated_pool_defers_slots_to_next_pass() {
    let builds = Arc::new(AtomicU32::new(0));
    let w = watcher(1, factory(&builds, false));

    let first = w.reconcile(Membership::new(Some(0), 1), 2);
    assert_eq!(first.started, slots(&[0]));
    assert_eq!(first.rejected, slots(&[1]));
    assert_eq!(w.stats(), WorkerStats::new(slots(&[0]), slots(&[])));

    // slot 1 moves here, but slot 0 still holds the only pool slot
    let moved = Membership::new(Some(1), 2);
    let second = w.reconcile(moved, 2);
    assert_eq!(second.rejected, slots(&[1]));
    assert_eq!(second.stopped, slots(&[0]));

    drain(&w).await;
    let third = w.reconcile(moved, 2);
    assert_eq!(third.reaped, slots(&[0]));
    assert_eq!(third.started, slots(&[1]));
}

#[tokio::test]
async fn factory_errors_reject_the_slot() {
    let broken: JobFactory = Arc::new(|_init: JobInit| -> Result<Box<dyn Job>, JobError> {
        Err(JobError::Failed("missing option".into()))
    });
    let w = watcher(10, broken);

    let out = w.reconcile(Membership::new(Some(0), 1), 1);
    assert_eq!(out.rejected, slots(&[0]));
    assert!(w.running_slots().is_empty());
}

/// Log sink shared with the subscriber under test
#[derive(Clone, Default)]
struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn abnormal_end_is_logged_when_reaped() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let reaped = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let builds = Arc::new(AtomicU32::new(0));
                let w = watcher(10, factory(&builds, true));
                let solo = Membership::new(Some(0), 1);

                w.reconcile(solo, 1);
                tokio::time::timeout(Duration::from_secs(5), async {
                    while w.state.lock().running.values().any(Worker::is_running) {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                })
                .await
                .unwrap();
                let out = w.reconcile(solo, 0);
                drain(&w).await;
                out.reaped
            })
    });

    let logs = String::from_utf8_lossy(&logs.0.lock()).to_string();
    assert_eq!(reaped, slots(&[0]));
    assert!(logs.contains("worker ended abnormally"), "logs:\n{logs}");
    assert!(logs.contains("first perform fails"), "logs:\n{logs}");
    assert!(logs.contains("job=sync"), "logs:\n{logs}");
}
