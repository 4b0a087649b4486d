// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::DaemonError;
use pb_core::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber: a non-blocking file writer when
/// `log_path` is set, stdout otherwise.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and closes the file writer.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config.verbose)));

    let Some(log_path) = &config.log_path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .map_err(|e| DaemonError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let (dir, file_name) = split_log_path(log_path)?;
    std::fs::create_dir_all(&dir)?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| DaemonError::Logging(e.to_string()))?;
    Ok(Some(guard))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, OsString), DaemonError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| DaemonError::Logging(format!("{} has no file name", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name.to_os_string()))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
