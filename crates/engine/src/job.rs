// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job contract
//!
//! A worker repeatedly calls [`Job::perform`]. Most jobs implement
//! [`BatchJob`] instead and run inside a [`BatchRunner`], which takes the
//! slot's worker lock, fetches a record set, processes it record by record
//! and reports the status the job set along the way.

use crate::error::JobError;
use crate::lock::{LockHandle, LockStrategy, LockTarget};
use crate::registry::JobInit;
use async_trait::async_trait;
use pb_core::{Directive, JobConfig, JobId, SlotId};
use std::sync::Arc;
use std::time::Duration;

/// Unit of work driven by a worker.
#[async_trait]
pub trait Job: Send + 'static {
    /// One iteration. The directive tells the worker what to do next.
    async fn perform(&mut self) -> Result<Directive, JobError>;
}

/// Per-slot state handed to every [`BatchJob`] hook.
#[derive(Debug, Clone)]
pub struct JobContext {
    slot: SlotId,
    config: Arc<JobConfig>,
    status: Directive,
}

impl JobContext {
    pub fn new(slot: SlotId, config: Arc<JobConfig>) -> Self {
        Self {
            slot,
            config,
            status: Directive::Continue,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.config.id
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.config.option(key)
    }

    /// Stop this worker once the current `perform()` returns.
    pub fn status_abort(&mut self) {
        self.status = Directive::Abort;
    }

    /// Sleep for `duration` once the current `perform()` returns.
    pub fn status_sleep(&mut self, duration: Duration) {
        self.status = Directive::Sleep(duration);
    }

    pub fn status(&self) -> Directive {
        self.status
    }

    fn reset_status(&mut self) {
        self.status = Directive::Continue;
    }
}

/// Lock, fetch, process, unlock.
///
/// `lock_records`, `process_record` and `unlock_records` have no useful
/// default and fail with [`JobError::NotImplemented`] unless overridden.
#[async_trait]
pub trait BatchJob: Send + 'static {
    type Record: Send;

    async fn before_perform(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }

    /// Claim and return the records to process this round.
    async fn lock_records(&mut self, _ctx: &mut JobContext) -> Result<Vec<Self::Record>, JobError> {
        Err(JobError::NotImplemented("lock_records"))
    }

    async fn process_record(
        &mut self,
        _ctx: &mut JobContext,
        _record: Self::Record,
    ) -> Result<(), JobError> {
        Err(JobError::NotImplemented("process_record"))
    }

    /// Give back whatever `lock_records` claimed. Runs even when the batch
    /// failed.
    async fn unlock_records(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Err(JobError::NotImplemented("unlock_records"))
    }

    async fn after_perform(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }
}

/// Adapts a [`BatchJob`] to [`Job`] under the slot's worker lock.
pub struct BatchRunner<J> {
    job: J,
    ctx: JobContext,
    lock: Option<Arc<dyn LockStrategy>>,
    lease: Duration,
}

impl<J: BatchJob> BatchRunner<J> {
    pub fn new(job: J, init: JobInit) -> Self {
        let lease = init.config.runtime_lock_timeout();
        Self {
            job,
            ctx: JobContext::new(init.slot, init.config),
            lock: init.lock,
            lease,
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    async fn run_batch(&mut self, lock: &mut dyn LockHandle) -> Result<(), JobError> {
        let records = self.job.lock_records(&mut self.ctx).await?;
        lock.extend().await?;
        for record in records {
            self.job.process_record(&mut self.ctx, record).await?;
            lock.extend().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<J: BatchJob> Job for BatchRunner<J> {
    async fn perform(&mut self) -> Result<Directive, JobError> {
        self.ctx.reset_status();
        self.job.before_perform(&mut self.ctx).await?;

        let strategy = self
            .lock
            .clone()
            .ok_or(JobError::NotImplemented("worker_lock"))?;
        let target = LockTarget::new(self.ctx.job_id().clone(), self.ctx.slot(), self.lease);

        match strategy.acquire(&target).await? {
            Some(mut lock) => {
                let batch = self.run_batch(lock.as_mut()).await;
                let unlocked = self.job.unlock_records(&mut self.ctx).await;
                let released = lock.release().await;
                batch?;
                unlocked?;
                released?;
            }
            None => {
                tracing::debug!(
                    job = %target.job_id,
                    slot = %target.slot,
                    "worker lock not acquired, skipping round"
                );
            }
        }

        self.job.after_perform(&mut self.ctx).await?;
        Ok(self.ctx.status())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
