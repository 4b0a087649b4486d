// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Process balancer engine: jobs, workers, locks and the manager that
//! partitions each job's slots across peer processes.

pub mod admin;
mod error;
pub mod job;
pub mod lock;
mod manager;
mod pool;
mod registry;
pub mod signal;
mod watcher;
mod worker;

pub use error::{EngineError, JobError, LockError, PoolError};
pub use job::{BatchJob, BatchRunner, Job, JobContext};
pub use lock::{
    AdvisoryBackend, AdvisoryLock, LocalAdvisoryLocks, LockHandle, LockStrategy, LockTarget,
    StoreLock,
};
pub use manager::{local_hostname, Manager, ManagerBuilder};
pub use pool::WorkerPool;
pub use registry::{JobFactory, JobInit, JobRegistry};
#[cfg(any(test, feature = "test-support"))]
pub use signal::FakeSignals;
pub use signal::{ProcessSignals, SignalDelivery};
pub use watcher::{ReconcileOutcome, Watcher};
pub use worker::{Worker, WorkerOutcome};
