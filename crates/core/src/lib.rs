// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pb-core: shared types for the process balancer

pub mod cancel;
pub mod config;
pub mod id;
pub mod job;
pub mod keys;
pub mod slot;
pub mod stats;

pub use cancel::{cancellation, CancelOrigin, CancelSignal, Cancelled};
pub use config::{Config, ConfigError};
pub use id::{Identity, JobId};
pub use job::{Directive, JobConfig, LockDriver, DEFAULT_RUNTIME_LOCK_TIMEOUT};
pub use slot::{owned_slots, Membership, SlotId};
pub use stats::{SlotEntry, WorkerStats};
