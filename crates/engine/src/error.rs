// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the balancing engine

use pb_core::{JobId, LockDriver};
use pb_store::StoreError;
use thiserror::Error;

/// Errors from lock strategies
#[derive(Debug, Error)]
pub enum LockError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("advisory lock {name} failed: {message}")]
    Advisory { name: String, message: String },
}

/// Errors escaping a job's `perform()`
#[derive(Debug, Error)]
pub enum JobError {
    /// A job contract method was called without an implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Failed(String),
}

/// Rejections from [`crate::WorkerPool::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is saturated")]
    Saturated,
    #[error("worker pool is shut down")]
    ShutDown,
}

/// Errors from the manager, registry and admin API
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown job class: {0}")]
    UnknownJobClass(String),
    #[error("job {job} selects the {driver} lock, which is not available")]
    LockDriverUnavailable { job: JobId, driver: LockDriver },
    #[error("must specify either by (an increment/decrement) or to (an exact value)")]
    MissingAdjustment,
    #[error("invalid worker count for job {job}: {value}")]
    InvalidWorkerCount { job: JobId, value: String },
    #[error("invalid signal name: {0}")]
    InvalidSignal(String),
    #[error("signal delivery failed: {0}")]
    SignalDelivery(String),
    #[error("job error: {0}")]
    Job(#[from] JobError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
