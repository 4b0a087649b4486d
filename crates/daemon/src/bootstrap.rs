// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config and store setup from the process environment

use crate::env;
use crate::error::DaemonError;
use pb_core::Config;
use std::path::Path;

/// Load `path` for the current environment, taking the store URL from the
/// environment when the file sets none.
pub fn load_config(path: &Path) -> Result<Config, DaemonError> {
    let environment = env::environment();
    let mut config = Config::load(path, Some(&environment))?;
    if config.store_url.is_none() {
        config.store_url = env::store_url();
    }
    Ok(config)
}

#[cfg(feature = "redis")]
const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/";

/// Store handle used by the daemon.
#[cfg(feature = "redis")]
pub type DaemonStore = pb_store::TracedStore<pb_store::NamespacedStore<pb_store::RedisStore>>;

/// Connect to the configured Redis server, scoped to the configured
/// namespace and wrapped for tracing and read-only failover.
#[cfg(feature = "redis")]
pub async fn connect_store(config: &Config) -> Result<DaemonStore, DaemonError> {
    let url = config.store_url.as_deref().unwrap_or(DEFAULT_STORE_URL);
    let store = pb_store::RedisStore::connect(url).await?;
    let namespace = config.store_namespace.as_deref().unwrap_or_default();
    if !namespace.is_empty() {
        tracing::info!(namespace, "store keys namespaced");
    }
    Ok(pb_store::TracedStore::new(pb_store::NamespacedStore::new(
        store, namespace,
    )))
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
