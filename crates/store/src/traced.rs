// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper with read-only failover

use crate::{Command, Reply, Store, StoreError, WatchSession};
use async_trait::async_trait;

/// Wrapper that adds tracing to any [`Store`].
///
/// A `READONLY` reply means the connection landed on a replica after a
/// failover. The wrapper reconnects once and retries the call; any other
/// error, or a second `READONLY`, is returned to the caller.
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S: Store> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn failover(&self, op: &'static str) -> Result<(), StoreError> {
        tracing::warn!(op, "store is read-only, reconnecting");
        self.inner.reconnect().await.inspect_err(|e| {
            tracing::error!(op, error = %e, "reconnect failed");
        })
    }
}

#[async_trait]
impl<S: Store> Store for TracedStore<S> {
    type Watch = TracedWatch<S::Watch>;

    async fn exec(&self, command: Command) -> Result<Reply, StoreError> {
        let name = command.name();
        tracing::trace!(cmd = name, key = command.key(), "exec");
        let result = match self.inner.exec(command.clone()).await {
            Err(StoreError::ReadOnly) => {
                self.failover("exec").await?;
                self.inner.exec(command).await
            }
            other => other,
        };
        if let Err(ref e) = result {
            tracing::warn!(cmd = name, error = %e, "command failed");
        }
        result
    }

    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        tracing::trace!(count = commands.len(), "multi");
        let result = match self.inner.multi(commands.clone()).await {
            Err(StoreError::ReadOnly) => {
                self.failover("multi").await?;
                self.inner.multi(commands).await
            }
            other => other,
        };
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "transaction failed");
        }
        result
    }

    async fn watch(&self, key: &str) -> Result<Self::Watch, StoreError> {
        tracing::trace!(key, "watch");
        let result = match self.inner.watch(key).await {
            Err(StoreError::ReadOnly) => {
                self.failover("watch").await?;
                self.inner.watch(key).await
            }
            other => other,
        };
        match result {
            Ok(inner) => Ok(TracedWatch {
                inner,
                key: key.to_string(),
            }),
            Err(e) => {
                tracing::warn!(key, error = %e, "watch failed");
                Err(e)
            }
        }
    }

    async fn reconnect(&self) -> Result<(), StoreError> {
        self.inner.reconnect().await
    }
}

/// Watch opened through a [`TracedStore`]
pub struct TracedWatch<W> {
    inner: W,
    key: String,
}

#[async_trait]
impl<W: WatchSession> WatchSession for TracedWatch<W> {
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError> {
        let result = self.inner.exec(command).await;
        if let Err(ref e) = result {
            tracing::warn!(key = %self.key, error = %e, "watched command failed");
        }
        result
    }

    async fn commit(self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError> {
        let result = self.inner.commit(commands).await;
        match &result {
            Ok(Some(_)) => tracing::trace!(key = %self.key, "commit applied"),
            Ok(None) => tracing::debug!(key = %self.key, "watched key changed, commit aborted"),
            Err(e) => tracing::warn!(key = %self.key, error = %e, "commit failed"),
        }
        result
    }

    async fn unwatch(self) -> Result<(), StoreError> {
        self.inner.unwatch().await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
