// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lock strategies
//!
//! A job's `perform()` runs its batch while holding the worker lock for its
//! slot. Strategies are interchangeable behind [`LockStrategy`]; the held
//! lock is exposed to the batch as a [`LockHandle`] so long batches can
//! renew their lease.

mod advisory;
mod store;

pub use advisory::{AdvisoryBackend, AdvisoryLock, LocalAdvisoryLocks};
pub use store::{StoreLock, StoreLockHandle, ACQUIRE_TIMEOUT, BACKOFF_MAX, BACKOFF_MIN};

use crate::error::LockError;
use async_trait::async_trait;
use pb_core::{JobId, SlotId};
use std::time::Duration;

/// What a worker lock guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTarget {
    pub job_id: JobId,
    pub slot: SlotId,
    /// Lease for strategies that expire their locks.
    pub lease: Duration,
}

impl LockTarget {
    pub fn new(job_id: JobId, slot: SlotId, lease: Duration) -> Self {
        Self {
            job_id,
            slot,
            lease,
        }
    }
}

/// Strategy for acquiring a worker lock.
#[async_trait]
pub trait LockStrategy: Send + Sync + 'static {
    /// Try to take the lock. `Ok(None)` means it could not be taken within
    /// the strategy's bound; the caller skips this round.
    async fn acquire(&self, target: &LockTarget) -> Result<Option<Box<dyn LockHandle>>, LockError>;
}

/// A held worker lock.
#[async_trait]
pub trait LockHandle: Send {
    /// Renew the lease. Returns `false` when the lock is no longer ours and
    /// nothing was renewed.
    async fn extend(&mut self) -> Result<bool, LockError>;

    /// Give the lock up. Further calls are no-ops.
    async fn release(&mut self) -> Result<(), LockError>;
}
