// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher: reconciles one job's running workers against the owned slots

use crate::lock::LockStrategy;
use crate::pool::WorkerPool;
use crate::registry::{JobFactory, JobInit};
use crate::worker::Worker;
use parking_lot::Mutex;
use pb_core::{JobConfig, JobId, Membership, SlotId, WorkerStats};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// What one reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub started: Vec<SlotId>,
    pub stopped: Vec<SlotId>,
    /// Stopping workers whose run loop finished and were dropped.
    pub reaped: Vec<SlotId>,
    /// Desired slots that could not be started this pass.
    pub rejected: Vec<SlotId>,
}

#[derive(Default)]
struct WatcherState {
    running: BTreeMap<SlotId, Worker>,
    stopping: Vec<Worker>,
    stats: WorkerStats,
}

/// Owns the workers of one job in this process.
pub struct Watcher {
    config: Arc<JobConfig>,
    factory: JobFactory,
    lock: Option<Arc<dyn LockStrategy>>,
    pool: WorkerPool,
    state: Mutex<WatcherState>,
}

impl Watcher {
    pub fn new(
        config: JobConfig,
        factory: JobFactory,
        lock: Option<Arc<dyn LockStrategy>>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            lock,
            pool,
            state: Mutex::new(WatcherState::default()),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.config.id
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Latest stats snapshot.
    pub fn stats(&self) -> WorkerStats {
        self.state.lock().stats.clone()
    }

    pub fn running_slots(&self) -> BTreeSet<SlotId> {
        self.state.lock().running.keys().copied().collect()
    }

    /// Bring the running workers in line with the slots this process owns
    /// for `desired` workers fleet-wide.
    ///
    /// Never blocks: stopped workers are only asked to stop and are reaped
    /// by a later pass once their run loop has ended.
    pub fn reconcile(&self, membership: Membership, desired: u32) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let mut state = self.state.lock();

        self.reap(&mut state, &mut outcome);

        let keep = membership.owned_slots(desired);
        let current: BTreeSet<SlotId> = state.running.keys().copied().collect();

        for &slot in keep.difference(&current) {
            match self.start(slot) {
                Some(worker) => {
                    state.running.insert(slot, worker);
                    outcome.started.push(slot);
                }
                None => outcome.rejected.push(slot),
            }
        }

        for slot in current.difference(&keep) {
            if let Some(worker) = state.running.remove(slot) {
                worker.stop();
                state.stopping.push(worker);
                outcome.stopped.push(*slot);
            }
        }

        state.stats = WorkerStats::new(
            state.running.keys().copied(),
            state.stopping.iter().map(Worker::slot),
        );

        if !outcome.started.is_empty() || !outcome.stopped.is_empty() {
            tracing::info!(
                job = %self.config.id,
                index = ?membership.index,
                peers = membership.peer_count,
                desired,
                started = ?outcome.started,
                stopped = ?outcome.stopped,
                "reconciled workers"
            );
        }
        outcome
    }

    fn reap(&self, state: &mut WatcherState, outcome: &mut ReconcileOutcome) {
        let ended: Vec<SlotId> = state
            .running
            .iter()
            .filter(|(_, worker)| !worker.is_running())
            .map(|(slot, _)| *slot)
            .collect();
        for slot in ended {
            if let Some(worker) = state.running.remove(&slot) {
                worker.stop();
                state.stopping.push(worker);
            }
        }

        state.stopping.retain(|worker| {
            if !worker.is_stopped() {
                return true;
            }
            match worker.reason() {
                Some(reason) => tracing::warn!(
                    job = %self.config.id,
                    slot = %worker.slot(),
                    reason = %reason,
                    "worker ended abnormally, slot will restart if still owned"
                ),
                None => tracing::debug!(job = %self.config.id, slot = %worker.slot(), "worker reaped"),
            }
            outcome.reaped.push(worker.slot());
            false
        });
    }

    fn start(&self, slot: SlotId) -> Option<Worker> {
        let init = JobInit {
            slot,
            config: Arc::clone(&self.config),
            lock: self.lock.clone(),
        };
        let job = match (self.factory)(init) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job = %self.config.id, %slot, error = %e, "failed to build job");
                return None;
            }
        };
        match Worker::spawn(&self.pool, self.config.id.clone(), slot, job) {
            Ok(worker) => Some(worker),
            Err(e) => {
                tracing::warn!(job = %self.config.id, %slot, error = %e, "worker not started, retrying next pass");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
