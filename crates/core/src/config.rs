// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration loaded from TOML.
//!
//! ```toml
//! store_namespace = "billing"
//! max_threads = 10
//! shutdown_timeout = 30
//!
//! [environments.production]
//! max_threads = 25
//!
//! [jobs.sync_orders]
//! class = "SyncOrders"
//! lock = "store"
//! runtime_lock_timeout = 60
//! ```
//!
//! Top-level settings are overlaid by `environments.<name>` for the selected
//! environment. Every key of a job table other than `class` and `lock` is
//! passed to the job as an option.

use crate::job::{JobConfig, LockDriver};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid job option: {0}")]
    Option(#[from] serde_json::Error),
    #[error("job '{job}': {message}")]
    InvalidJob { job: String, message: String },
    #[error("unknown lock driver: {0}")]
    UnknownLockDriver(String),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Settings for one balancer process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key-value store URL; resolved from the environment when unset.
    pub store_url: Option<String>,
    /// Prefix for every store key, so several applications can share one
    /// server.
    pub store_namespace: Option<String>,
    /// Capacity of the shared worker pool.
    pub max_threads: u32,
    /// How long `stop()` waits for workers before killing them.
    #[serde(deserialize_with = "secs")]
    pub shutdown_timeout: Duration,
    #[serde(deserialize_with = "secs")]
    pub heartbeat_interval: Duration,
    /// Expiry of the liveness and worker-stats records.
    #[serde(deserialize_with = "secs")]
    pub liveness_ttl: Duration,
    pub verbose: bool,
    pub log_path: Option<PathBuf>,
    #[serde(skip)]
    pub jobs: Vec<JobConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_namespace: None,
            max_threads: 10,
            shutdown_timeout: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(5),
            liveness_ttl: Duration::from_secs(60),
            verbose: false,
            log_path: None,
            jobs: Vec::new(),
        }
    }
}

fn secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl Config {
    /// Read and parse a config file for the given environment.
    pub fn load(path: &Path, environment: Option<&str>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, environment)
    }

    /// Parse config text, applying `environments.<environment>` overrides.
    pub fn from_toml_str(text: &str, environment: Option<&str>) -> Result<Self, ConfigError> {
        let mut root: toml::Table = text.parse()?;
        let jobs = root.remove("jobs");
        let environments = root.remove("environments");

        if let (Some(name), Some(toml::Value::Table(mut environments))) = (environment, environments)
        {
            if let Some(toml::Value::Table(overrides)) = environments.remove(name) {
                root.extend(overrides);
            }
        }

        let mut config: Config = toml::Value::Table(root).try_into()?;
        config.jobs = match jobs {
            Some(toml::Value::Table(jobs)) => parse_jobs(jobs)?,
            Some(_) => return Err(ConfigError::Invalid("`jobs` must be a table".to_string())),
            None => Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::Invalid("max_threads must be at least 1".to_string()));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "heartbeat_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_jobs(jobs: toml::Table) -> Result<Vec<JobConfig>, ConfigError> {
    jobs.into_iter()
        .map(|(id, value)| {
            let toml::Value::Table(mut table) = value else {
                return Err(ConfigError::InvalidJob {
                    job: id,
                    message: "expected a table".to_string(),
                });
            };
            let class = match table.remove("class") {
                Some(toml::Value::String(class)) => class,
                _ => {
                    return Err(ConfigError::InvalidJob {
                        job: id,
                        message: "missing `class`".to_string(),
                    })
                }
            };
            let lock = match table.remove("lock") {
                Some(toml::Value::String(driver)) => Some(driver.parse::<LockDriver>()?),
                Some(_) => {
                    return Err(ConfigError::InvalidJob {
                        job: id,
                        message: "`lock` must be a string".to_string(),
                    })
                }
                None => None,
            };
            let mut config = JobConfig::new(id, class);
            config.lock = lock;
            for (key, value) in table {
                config.options.insert(key, serde_json::to_value(value)?);
            }
            Ok(config)
        })
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
