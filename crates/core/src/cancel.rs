// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot cancellation with separate writer and reader handles.
//!
//! [`cancellation`] returns a [`CancelOrigin`] (resolves) and a
//! [`CancelSignal`] (observes). Both are cheap to clone and may be shared
//! across threads. Resolution is permanent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Returned by [`CancelSignal::check`] once the token is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Create an unresolved token, returning its writer and reader halves.
pub fn cancellation() -> (CancelOrigin, CancelSignal) {
    let state = Arc::new(AtomicBool::new(false));
    (
        CancelOrigin {
            state: Arc::clone(&state),
        },
        CancelSignal { state },
    )
}

/// Writer half: resolves the token.
#[derive(Debug, Clone)]
pub struct CancelOrigin {
    state: Arc<AtomicBool>,
}

impl CancelOrigin {
    /// Resolve the token. Returns `true` if this call performed the resolution.
    pub fn resolve(&self) -> bool {
        !self.state.swap(true, Ordering::AcqRel)
    }

    pub fn is_resolved(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }

    /// A reader for this token.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            state: Arc::clone(&self.state),
        }
    }
}

/// Reader half: observes resolution.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    state: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn is_resolved(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once resolved, for use with `?` at loop heads.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_resolved() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
