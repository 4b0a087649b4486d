//! Test helpers for behavioral specifications.
//!
//! Provides jobs, process construction and polling shared by the specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pb_core::{Config, Directive, Identity, JobConfig, JobId, LockDriver, SlotId};
use pb_engine::admin::{adjust_scheduled_workers, Adjustment};
use pb_engine::{
    BatchJob, FakeSignals, Job, JobContext, JobError, JobInit, JobRegistry, Manager,
};
use pb_store::{Command, MemoryStore, Store};
use std::sync::Arc;
use std::time::Duration;

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2000;

pub const JOB: &str = "sync";

/// Job that idles in short sleeps until its worker is stopped.
pub struct Looping;

#[async_trait]
impl Job for Looping {
    async fn perform(&mut self) -> Result<Directive, JobError> {
        Ok(Directive::Sleep(Duration::from_millis(5)))
    }
}

/// `(slot, record)` pairs processed by every [`Ledger`] instance.
pub type LedgerLog = Arc<Mutex<Vec<(SlotId, u32)>>>;

/// Batch job that claims two records per round.
pub struct Ledger {
    log: LedgerLog,
    next: u32,
}

#[async_trait]
impl BatchJob for Ledger {
    type Record = u32;

    async fn lock_records(&mut self, _ctx: &mut JobContext) -> Result<Vec<u32>, JobError> {
        let batch = vec![self.next, self.next + 1];
        self.next += 2;
        Ok(batch)
    }

    async fn process_record(&mut self, ctx: &mut JobContext, record: u32) -> Result<(), JobError> {
        self.log.lock().push((ctx.slot(), record));
        Ok(())
    }

    async fn unlock_records(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }

    async fn after_perform(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        ctx.status_sleep(Duration::from_millis(5));
        Ok(())
    }
}

pub fn registry(log: &LedgerLog) -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register("Looping", |_init: JobInit| -> Result<Box<dyn Job>, JobError> {
        Ok(Box::new(Looping))
    });
    let log = Arc::clone(log);
    registry.register_batch("Ledger", move |_init: &JobInit| {
        Ok(Ledger {
            log: Arc::clone(&log),
            next: 0,
        })
    });
    registry
}

/// A balancer process named `name` running `jobs` against `store`.
pub fn process_with(store: &MemoryStore, name: &str, jobs: Vec<JobConfig>) -> Manager<MemoryStore> {
    let config = Config {
        jobs,
        ..Config::default()
    };
    Manager::builder(store.clone(), registry(&LedgerLog::default()), config)
        .identity(Identity::new(name))
        .signals(FakeSignals::new())
        .build()
        .unwrap()
}

/// A balancer process running the looping `sync` job.
pub fn process(store: &MemoryStore, name: &str) -> Manager<MemoryStore> {
    process_with(store, name, vec![JobConfig::new(JOB, "Looping")])
}

/// A process running the `Ledger` batch job under the store lock.
pub fn ledger_process(store: &MemoryStore, name: &str, log: &LedgerLog) -> Manager<MemoryStore> {
    let config = Config {
        jobs: vec![JobConfig::new(JOB, "Ledger").with_lock(LockDriver::Store)],
        ..Config::default()
    };
    Manager::builder(store.clone(), registry(log), config)
        .identity(Identity::new(name))
        .signals(FakeSignals::new())
        .build()
        .unwrap()
}

pub async fn set_desired(store: &MemoryStore, count: i64) {
    adjust_scheduled_workers(store, &JobId::new(JOB), Adjustment::To(count))
        .await
        .unwrap();
}

pub fn running(process: &Manager<MemoryStore>) -> Vec<u32> {
    process.worker_stats()[&JobId::new(JOB)]
        .running_ids()
        .into_iter()
        .map(|s| s.0)
        .collect()
}

pub fn stopping(process: &Manager<MemoryStore>) -> Vec<u32> {
    process.worker_stats()[&JobId::new(JOB)]
        .stopping_ids()
        .into_iter()
        .map(|s| s.0)
        .collect()
}

pub async fn get(store: &MemoryStore, key: &str) -> Option<String> {
    store
        .exec(Command::get(key))
        .await
        .unwrap()
        .into_opt_string()
        .unwrap()
}

/// Heartbeat `process` until `done` holds.
pub async fn beat_until(process: &Manager<MemoryStore>, mut done: impl FnMut() -> bool) {
    let polls = SPEC_WAIT_MAX_MS / SPEC_POLL_INTERVAL_MS;
    for _ in 0..polls {
        process.try_heartbeat().await.unwrap();
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS)).await;
    }
    panic!("condition not reached within {SPEC_WAIT_MAX_MS}ms");
}

/// Poll until `done` holds.
pub async fn wait_for(mut done: impl FnMut() -> bool) {
    let polls = SPEC_WAIT_MAX_MS / SPEC_POLL_INTERVAL_MS;
    for _ in 0..polls {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS)).await;
    }
    panic!("condition not reached within {SPEC_WAIT_MAX_MS}ms");
}
