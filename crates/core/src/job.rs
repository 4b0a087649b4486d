// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static job configuration and the directives a job returns to its worker.

use crate::config::ConfigError;
use crate::id::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Lease used by the store lock when a job sets no `runtime_lock_timeout`.
pub const DEFAULT_RUNTIME_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Which lock strategy a job's worker lock uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockDriver {
    /// Leased `SET NX` key in the shared store.
    Store,
    /// Named advisory lock held by an external system.
    Advisory,
}

impl FromStr for LockDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" | "simple_redis" => Ok(Self::Store),
            "advisory" | "advisory_lock" => Ok(Self::Advisory),
            other => Err(ConfigError::UnknownLockDriver(other.to_string())),
        }
    }
}

impl fmt::Display for LockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Advisory => write!(f, "advisory"),
        }
    }
}

/// Per-job configuration supplied at process start. Never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: JobId,
    /// Registry name of the job implementation.
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockDriver>,
    /// Class-specific options.
    #[serde(default, flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl JobConfig {
    pub fn new(id: impl Into<JobId>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            lock: None,
            options: serde_json::Map::new(),
        }
    }

    pub fn with_lock(mut self, lock: LockDriver) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }

    /// Store-lock lease from the `runtime_lock_timeout` option (seconds).
    pub fn runtime_lock_timeout(&self) -> Duration {
        self.option("runtime_lock_timeout")
            .and_then(serde_json::Value::as_u64)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RUNTIME_LOCK_TIMEOUT)
    }
}

/// What a worker does after one `perform()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directive {
    /// Perform again immediately.
    #[default]
    Continue,
    /// Stop this worker from within.
    Abort,
    /// Suspend for the duration, then perform again.
    Sleep(Duration),
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
