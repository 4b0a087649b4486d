// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process balancer bootstrap for an embedding process
//!
//! Resolves configuration from the environment, sets up logging and runs
//! the OS-signal loop that drives a [`pb_engine::Manager`] until shutdown.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bootstrap;
pub mod env;
mod error;
mod logging;
mod signals;

#[cfg(feature = "redis")]
pub use bootstrap::{connect_store, DaemonStore};
pub use bootstrap::load_config;
pub use error::{DaemonError, SignalError};
pub use logging::{default_filter, setup_logging};
pub use signals::{handle_signal, run_until_shutdown, signal_action, SignalAction};
