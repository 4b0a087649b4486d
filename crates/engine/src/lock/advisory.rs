// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named advisory locks held by an external system

use super::{LockHandle, LockStrategy, LockTarget};
use crate::error::LockError;
use async_trait::async_trait;
use parking_lot::Mutex;
use pb_core::keys;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// System that owns named advisory locks (e.g. a database).
///
/// The lock is held for as long as the returned guard is alive.
#[async_trait]
pub trait AdvisoryBackend: Send + Sync + 'static {
    type Guard: Send + 'static;

    /// Wait for and take the lock called `name`.
    async fn lock(&self, name: &str) -> Result<Self::Guard, LockError>;
}

/// Worker lock backed by `worker_lock_<job>_<slot>` advisory locks.
///
/// The hold spans the whole batch, so there is no lease to extend.
#[derive(Clone)]
pub struct AdvisoryLock<B> {
    backend: B,
}

impl<B: AdvisoryBackend> AdvisoryLock<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: AdvisoryBackend> LockStrategy for AdvisoryLock<B> {
    async fn acquire(&self, target: &LockTarget) -> Result<Option<Box<dyn LockHandle>>, LockError> {
        let name = keys::advisory_lock(&target.job_id, target.slot);
        let guard = self.backend.lock(&name).await?;
        tracing::trace!(name = %name, "advisory lock held");
        Ok(Some(Box::new(AdvisoryHandle {
            name,
            guard: Some(guard),
        })))
    }
}

struct AdvisoryHandle<G> {
    name: String,
    guard: Option<G>,
}

#[async_trait]
impl<G: Send + 'static> LockHandle for AdvisoryHandle<G> {
    async fn extend(&mut self) -> Result<bool, LockError> {
        Ok(self.guard.is_some())
    }

    async fn release(&mut self) -> Result<(), LockError> {
        if self.guard.take().is_some() {
            tracing::trace!(name = %self.name, "advisory lock released");
        }
        Ok(())
    }
}

/// In-process advisory locks, one async mutex per name.
///
/// Serializes workers of a single process only.
#[derive(Clone, Default)]
pub struct LocalAdvisoryLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LocalAdvisoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is currently held.
    pub fn is_held(&self, name: &str) -> bool {
        self.locks
            .lock()
            .get(name)
            .is_some_and(|m| m.try_lock().is_err())
    }
}

#[async_trait]
impl AdvisoryBackend for LocalAdvisoryLocks {
    type Guard = OwnedMutexGuard<()>;

    async fn lock(&self, name: &str) -> Result<OwnedMutexGuard<()>, LockError> {
        let mutex = Arc::clone(self.locks.lock().entry(name.to_string()).or_default());
        Ok(mutex.lock_owned().await)
    }
}

#[cfg(test)]
#[path = "advisory_tests.rs"]
mod tests;
