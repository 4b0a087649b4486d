// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS-signal dispatch for a running manager
//!
//! | Signal        | Action                          |
//! |---------------|---------------------------------|
//! | `INT`, `TERM` | stop, then return               |
//! | `USR1`, `TSTP`| quiet: drain every job          |
//! | `TTIN`        | log every job's worker stats    |
//!
//! Remote signals popped by the heartbeat are raised on this process and
//! come back through the same loop.

use crate::error::SignalError;
use nix::sys::signal::Signal;
use pb_engine::signal::normalize_signal_name;
use pb_engine::Manager;
use pb_store::Store;
use tokio::signal::unix::{signal, Signal as SignalStream, SignalKind};

/// What the signal loop does for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Stop,
    Quiet,
    DumpStats,
    Ignore,
}

/// Action for a signal name in short or `SIG`-prefixed form.
pub fn signal_action(name: &str) -> SignalAction {
    match normalize_signal_name(name).as_str() {
        "INT" | "TERM" => SignalAction::Stop,
        "USR1" | "TSTP" => SignalAction::Quiet,
        "TTIN" => SignalAction::DumpStats,
        _ => SignalAction::Ignore,
    }
}

/// Apply the action for `name` to `manager` and return it.
pub async fn handle_signal<S: Store>(manager: &Manager<S>, name: &str) -> SignalAction {
    let action = signal_action(name);
    match action {
        SignalAction::Stop => {
            tracing::info!(signal = name, "shutting down");
            manager.stop().await;
        }
        SignalAction::Quiet => {
            tracing::info!(signal = name, "no longer accepting work");
            manager.quiet().await;
        }
        SignalAction::DumpStats => {
            for (job, stats) in manager.worker_stats() {
                tracing::info!(
                    %job,
                    running = ?stats.running_ids(),
                    stopping = ?stats.stopping_ids(),
                    "worker stats"
                );
            }
        }
        SignalAction::Ignore => tracing::info!(signal = name, "no handler for signal"),
    }
    action
}

fn install(name: &'static str, kind: SignalKind) -> Result<SignalStream, SignalError> {
    signal(kind).map_err(|source| SignalError::Install { name, source })
}

/// Start `manager`'s heartbeat and dispatch OS signals until `INT` or
/// `TERM` has stopped it.
pub async fn run_until_shutdown<S: Store>(manager: &Manager<S>) -> Result<(), SignalError> {
    let mut sigint = install("INT", SignalKind::interrupt())?;
    let mut sigterm = install("TERM", SignalKind::terminate())?;
    let mut sigusr1 = install("USR1", SignalKind::user_defined1())?;
    let mut sigtstp = install("TSTP", SignalKind::from_raw(Signal::SIGTSTP as i32))?;
    let mut sigttin = install("TTIN", SignalKind::from_raw(Signal::SIGTTIN as i32))?;

    manager.run();
    tracing::info!(identity = %manager.identity(), "balancer running");

    loop {
        let name = tokio::select! {
            _ = sigint.recv() => "INT",
            _ = sigterm.recv() => "TERM",
            _ = sigusr1.recv() => "USR1",
            _ = sigtstp.recv() => "TSTP",
            _ = sigttin.recv() => "TTIN",
        };
        if handle_signal(manager, name).await == SignalAction::Stop {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
