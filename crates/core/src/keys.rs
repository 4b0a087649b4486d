// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-store key names.

use crate::id::{Identity, JobId};
use crate::slot::SlotId;

/// Ordered membership list of live identities.
pub const PROCESSES_KEY: &str = "processes";

/// Hash of job id to desired worker count.
pub const WORKER_COUNT_KEY: &str = "worker_counts";

/// Liveness hash of one process.
pub fn liveness(identity: &Identity) -> String {
    identity.to_string()
}

/// Queue of signal names pending delivery to one process.
pub fn signals(identity: &Identity) -> String {
    format!("{}-signals", identity)
}

/// Hash of job id to published worker stats of one process.
pub fn workers(identity: &str) -> String {
    format!("{}:workers", identity)
}

/// Store lock guarding one slot of a job.
pub fn slot_lock(job_id: &JobId, slot: SlotId) -> String {
    format!("lock_{}_{}", job_id, slot)
}

/// Advisory lock name guarding one slot of a job.
pub fn advisory_lock(job_id: &JobId, slot: SlotId) -> String {
    format!("worker_lock_{}_{}", job_id, slot)
}
