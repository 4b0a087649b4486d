// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key namespacing for stores shared between applications

use crate::{Command, Reply, Store, StoreError, WatchSession};
use async_trait::async_trait;
use std::sync::Arc;

/// Wrapper that prefixes every key with `<namespace>:`.
///
/// An empty namespace passes keys through unchanged.
#[derive(Clone)]
pub struct NamespacedStore<S> {
    inner: S,
    prefix: Arc<str>,
}

impl<S: Store> NamespacedStore<S> {
    pub fn new(inner: S, namespace: &str) -> Self {
        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            format!("{namespace}:")
        };
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn scoped(&self, command: Command) -> Command {
        command.prefixed(&self.prefix)
    }
}

#[async_trait]
impl<S: Store> Store for NamespacedStore<S> {
    type Watch = NamespacedWatch<S::Watch>;

    async fn exec(&self, command: Command) -> Result<Reply, StoreError> {
        self.inner.exec(self.scoped(command)).await
    }

    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        let commands = commands.into_iter().map(|c| self.scoped(c)).collect();
        self.inner.multi(commands).await
    }

    async fn watch(&self, key: &str) -> Result<Self::Watch, StoreError> {
        let key = format!("{}{key}", self.prefix);
        let inner = self.inner.watch(&key).await?;
        Ok(NamespacedWatch {
            inner,
            prefix: Arc::clone(&self.prefix),
        })
    }

    async fn reconnect(&self) -> Result<(), StoreError> {
        self.inner.reconnect().await
    }
}

/// Watch opened through a [`NamespacedStore`]
pub struct NamespacedWatch<W> {
    inner: W,
    prefix: Arc<str>,
}

#[async_trait]
impl<W: WatchSession> WatchSession for NamespacedWatch<W> {
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError> {
        let command = command.prefixed(&self.prefix);
        self.inner.exec(command).await
    }

    async fn commit(self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError> {
        let commands = commands
            .into_iter()
            .map(|c| c.prefixed(&self.prefix))
            .collect();
        self.inner.commit(commands).await
    }

    async fn unwatch(self) -> Result<(), StoreError> {
        self.inner.unwatch().await
    }
}

#[cfg(test)]
#[path = "namespaced_tests.rs"]
mod tests;
