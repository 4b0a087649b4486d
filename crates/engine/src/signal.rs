// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of signals popped from the store to this process

use crate::error::EngineError;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::str::FromStr;

/// Canonical short name: `sigusr1`, `SIGUSR1` and `USR1` all become `USR1`.
pub fn normalize_signal_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.strip_prefix("SIG") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

/// Parse a signal name in either short or `SIG`-prefixed form.
pub fn parse_signal(name: &str) -> Result<Signal, EngineError> {
    let short = normalize_signal_name(name);
    Signal::from_str(&format!("SIG{short}")).map_err(|_| EngineError::InvalidSignal(name.to_string()))
}

/// Delivers a named signal to the current process.
pub trait SignalDelivery: Send + Sync + 'static {
    fn deliver(&self, name: &str) -> Result<(), EngineError>;
}

/// Raises signals on this OS process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSignals;

impl SignalDelivery for ProcessSignals {
    fn deliver(&self, name: &str) -> Result<(), EngineError> {
        let signal = parse_signal(name)?;
        kill(Pid::this(), signal).map_err(|e| EngineError::SignalDelivery(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSignals;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::{normalize_signal_name, parse_signal, SignalDelivery};
    use crate::error::EngineError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records delivered signals instead of raising them.
    #[derive(Clone, Default)]
    pub struct FakeSignals {
        delivered: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSignals {
        pub fn new() -> Self {
            Self::default()
        }

        /// Normalized names of every delivered signal, in order
        pub fn delivered(&self) -> Vec<String> {
            self.delivered.lock().clone()
        }
    }

    impl SignalDelivery for FakeSignals {
        fn deliver(&self, name: &str) -> Result<(), EngineError> {
            parse_signal(name)?;
            self.delivered.lock().push(normalize_signal_name(name));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
