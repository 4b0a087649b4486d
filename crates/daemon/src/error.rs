// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use pb_core::ConfigError;
use pb_engine::EngineError;
use pb_store::StoreError;
use thiserror::Error;

/// Errors from bootstrapping the balancer
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("failed to set up logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the OS-signal loop
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to install SIG{name} handler: {source}")]
    Install {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
