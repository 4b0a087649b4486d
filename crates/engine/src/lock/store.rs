// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leased lock on a single store key
//!
//! Only safe against a single store node: `release` deletes the key without
//! checking the owner, so a holder whose lease already expired can delete a
//! successor's lock.

use super::{LockHandle, LockStrategy, LockTarget};
use crate::error::LockError;
use async_trait::async_trait;
use pb_core::{keys, Identity};
use pb_store::{Command, Store, WatchSession};
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Total time spent retrying `SET NX` before giving up.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(5000);
/// Bounds of the random pause between attempts.
pub const BACKOFF_MIN: Duration = Duration::from_millis(20);
pub const BACKOFF_MAX: Duration = Duration::from_millis(100);

/// Lock at `lock_<job>_<slot>` whose value is the holder's identity.
#[derive(Clone)]
pub struct StoreLock<S> {
    store: S,
    identity: Identity,
    timeout: Duration,
}

impl<S: Store> StoreLock<S> {
    pub fn new(store: S, identity: Identity) -> Self {
        Self {
            store,
            identity,
            timeout: ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn try_lock(&self, key: &str, lease: Duration) -> Result<bool, LockError> {
        let reply = self
            .store
            .exec(Command::set_nx(key, self.identity.as_str(), lease))
            .await?;
        Ok(reply.is_ok())
    }
}

fn backoff() -> Duration {
    let millis = rand::rng().random_range(BACKOFF_MIN.as_millis()..=BACKOFF_MAX.as_millis());
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

#[async_trait]
impl<S: Store> LockStrategy for StoreLock<S> {
    async fn acquire(&self, target: &LockTarget) -> Result<Option<Box<dyn LockHandle>>, LockError> {
        let key = keys::slot_lock(&target.job_id, target.slot);
        let start = Instant::now();
        loop {
            if self.try_lock(&key, target.lease).await? {
                tracing::trace!(key = %key, "lock acquired");
                return Ok(Some(Box::new(StoreLockHandle {
                    store: self.store.clone(),
                    key,
                    identity: self.identity.clone(),
                    lease: target.lease,
                    released: false,
                })));
            }
            if start.elapsed() >= self.timeout {
                tracing::debug!(key = %key, "lock not acquired before timeout");
                return Ok(None);
            }
            tokio::time::sleep(backoff()).await;
        }
    }
}

/// Held [`StoreLock`].
pub struct StoreLockHandle<S> {
    store: S,
    key: String,
    identity: Identity,
    lease: Duration,
    released: bool,
}

impl<S> StoreLockHandle<S> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl<S: Store> LockHandle for StoreLockHandle<S> {
    async fn extend(&mut self) -> Result<bool, LockError> {
        if self.released {
            return Ok(false);
        }
        let mut watch = self.store.watch(&self.key).await?;
        let holder = watch.exec(Command::get(&self.key)).await?.into_opt_string()?;
        if holder.as_deref() != Some(self.identity.as_str()) {
            watch.unwatch().await?;
            tracing::warn!(key = %self.key, holder = ?holder, "lock lost, not extending");
            return Ok(false);
        }
        let refreshed = watch
            .commit(vec![Command::set(
                &self.key,
                self.identity.as_str(),
                Some(self.lease),
            )])
            .await?;
        Ok(refreshed.is_some())
    }

    async fn release(&mut self) -> Result<(), LockError> {
        if std::mem::replace(&mut self.released, true) {
            return Ok(());
        }
        self.store.exec(Command::del(&self.key)).await?;
        tracing::trace!(key = %self.key, "lock released");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
