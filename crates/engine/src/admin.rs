// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator API: desired worker counts, fleet-wide running counts and
//! remote signals.

use crate::error::EngineError;
use crate::signal::parse_signal;
use pb_core::keys::{self, PROCESSES_KEY, WORKER_COUNT_KEY};
use pb_core::{Identity, JobId, WorkerStats};
use pb_store::{Command, Store};

/// Desired worker count when none has been stored.
pub const DEFAULT_SCHEDULED_WORKERS: u32 = 1;

/// Change to a job's desired worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Set an exact value.
    To(i64),
    /// Atomically add a delta (negative to decrease).
    By(i64),
}

impl Adjustment {
    /// `to` takes precedence when both are given.
    pub fn from_parts(by: Option<i64>, to: Option<i64>) -> Result<Self, EngineError> {
        match (to, by) {
            (Some(to), _) => Ok(Self::To(to)),
            (None, Some(by)) => Ok(Self::By(by)),
            (None, None) => Err(EngineError::MissingAdjustment),
        }
    }
}

/// Apply `adjustment` to `job`'s desired count. Returns the stored value.
pub async fn adjust_scheduled_workers<S: Store>(
    store: &S,
    job: &JobId,
    adjustment: Adjustment,
) -> Result<i64, EngineError> {
    let value = match adjustment {
        Adjustment::To(to) => {
            store
                .exec(Command::hset(
                    WORKER_COUNT_KEY,
                    vec![(job.to_string(), to.to_string())],
                ))
                .await?;
            to
        }
        Adjustment::By(by) => {
            store
                .exec(Command::hincrby(WORKER_COUNT_KEY, job.as_str(), by))
                .await?
                .into_int()?
        }
    };
    tracing::info!(%job, ?adjustment, value, "adjusted scheduled workers");
    Ok(value)
}

/// Desired worker count for `job`, 1 when unset. Negative values count as 0.
pub async fn scheduled_workers<S: Store>(store: &S, job: &JobId) -> Result<u32, EngineError> {
    let stored = store
        .exec(Command::hget(WORKER_COUNT_KEY, job.as_str()))
        .await?
        .into_opt_string()?;
    let Some(raw) = stored else {
        return Ok(DEFAULT_SCHEDULED_WORKERS);
    };
    let value: i64 = raw.trim().parse().map_err(|_| EngineError::InvalidWorkerCount {
        job: job.clone(),
        value: raw.clone(),
    })?;
    Ok(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

/// Running workers of `job` summed over every member's published stats.
///
/// Members without stats, or with stats that do not parse, count as zero.
pub async fn running_workers<S: Store>(store: &S, job: &JobId) -> Result<usize, EngineError> {
    let members = store.exec(Command::lrange(PROCESSES_KEY)).await?.into_list()?;
    let mut count = 0;
    for member in members {
        let data = store
            .exec(Command::hget(keys::workers(&member), job.as_str()))
            .await?
            .into_opt_string()?;
        let Some(data) = data else { continue };
        match serde_json::from_str::<WorkerStats>(&data) {
            Ok(stats) => count += stats.running.len(),
            Err(e) => tracing::debug!(%member, %job, error = %e, "skipping unreadable worker stats"),
        }
    }
    Ok(count)
}

/// Queue `signal` for delivery to the process `identity` on its next
/// heartbeat.
pub async fn send_signal<S: Store>(
    store: &S,
    identity: &Identity,
    signal: &str,
) -> Result<(), EngineError> {
    parse_signal(signal)?;
    store
        .exec(Command::lpush(keys::signals(identity), signal))
        .await?;
    tracing::info!(%identity, signal, "queued remote signal");
    Ok(())
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
