// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: one job instance running on the pool under cancellation

use crate::error::{JobError, PoolError};
use crate::job::Job;
use crate::pool::WorkerPool;
use parking_lot::Mutex;
use pb_core::{cancellation, CancelOrigin, CancelSignal, Directive, JobId, SlotId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// How a worker's run loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Stopped through its cancellation token.
    Cancelled,
    /// `perform()` returned an error.
    Failed(String),
}

/// Runs one slot of a job until stopped or failed.
pub struct Worker {
    job_id: JobId,
    slot: SlotId,
    origin: CancelOrigin,
    handle: JoinHandle<()>,
    outcome: Arc<Mutex<Option<WorkerOutcome>>>,
}

impl Worker {
    /// Submit `job`'s run loop to `pool`.
    pub fn spawn(
        pool: &WorkerPool,
        job_id: JobId,
        slot: SlotId,
        job: Box<dyn Job>,
    ) -> Result<Self, PoolError> {
        let (origin, signal) = cancellation();
        let outcome = Arc::new(Mutex::new(None));

        let span = tracing::info_span!("worker", job = %job_id, slot = %slot);
        let run = run_loop(job, origin.clone(), signal);
        let recorded = Arc::clone(&outcome);
        let handle = pool.submit(
            async move {
                let result = match run.await {
                    Ok(()) => {
                        tracing::debug!("worker cancelled");
                        WorkerOutcome::Cancelled
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "worker failed");
                        WorkerOutcome::Failed(e.to_string())
                    }
                };
                *recorded.lock() = Some(result);
            }
            .instrument(span),
        )?;

        Ok(Self {
            job_id,
            slot,
            origin,
            handle,
            outcome,
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Not finished and not asked to stop.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished() && !self.origin.is_resolved()
    }

    /// The run loop has finished, for any reason.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the run loop to exit at its next check. Idempotent.
    pub fn stop(&self) -> bool {
        self.origin.resolve();
        true
    }

    /// Why the worker ended abnormally, if it did.
    pub fn reason(&self) -> Option<String> {
        match &*self.outcome.lock() {
            Some(WorkerOutcome::Failed(message)) => Some(message.clone()),
            Some(WorkerOutcome::Cancelled) => None,
            None if self.handle.is_finished() => Some("worker task aborted".to_string()),
            None => None,
        }
    }

    pub fn outcome(&self) -> Option<WorkerOutcome> {
        self.outcome.lock().clone()
    }
}

async fn run_loop(
    mut job: Box<dyn Job>,
    origin: CancelOrigin,
    signal: CancelSignal,
) -> Result<(), JobError> {
    while signal.check().is_ok() {
        match job.perform().await? {
            Directive::Continue => tokio::task::yield_now().await,
            Directive::Abort => {
                origin.resolve();
            }
            Directive::Sleep(duration) => tokio::time::sleep(duration).await,
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
