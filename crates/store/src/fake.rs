// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::{Command, MemoryStore, MemoryWatch, Reply, Store, StoreError, WatchSession};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Exec(Command),
    Multi(Vec<Command>),
    Watch(String),
    Commit(Vec<Command>),
    Reconnect,
}

#[derive(Default)]
struct FakeStoreState {
    calls: Vec<StoreCall>,
    failures: VecDeque<StoreError>,
    on_watch: Option<(String, Command)>,
    reconnects: usize,
}

/// In-memory store that records calls and can inject failures.
///
/// Data lives in a [`MemoryStore`], so semantics match the in-process
/// store exactly.
#[derive(Clone, Default)]
pub struct FakeStore {
    data: MemoryStore,
    inner: Arc<Mutex<FakeStoreState>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backing data, for inspection or seeding.
    pub fn data(&self) -> &MemoryStore {
        &self.data
    }

    /// Fail the next store call (exec, multi, watch or commit) with `error`.
    /// Queued failures are consumed in order.
    pub fn fail_next(&self, error: StoreError) {
        self.inner.lock().failures.push_back(error);
    }

    /// Run `command` right after the next watch on `key` is opened,
    /// simulating a concurrent writer.
    pub fn on_watch(&self, key: &str, command: Command) {
        self.inner.lock().on_watch = Some((key.to_string(), command));
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands sent through `exec`, in order
    pub fn executed(&self) -> Vec<Command> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::Exec(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reconnects(&self) -> usize {
        self.inner.lock().reconnects
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        match inner.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for FakeStore {
    type Watch = FakeWatch;

    async fn exec(&self, command: Command) -> Result<Reply, StoreError> {
        self.record(StoreCall::Exec(command.clone()))?;
        self.data.exec(command).await
    }

    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        self.record(StoreCall::Multi(commands.clone()))?;
        self.data.multi(commands).await
    }

    async fn watch(&self, key: &str) -> Result<FakeWatch, StoreError> {
        self.record(StoreCall::Watch(key.to_string()))?;
        let watch = self.data.watch(key).await?;
        let interfering = {
            let mut inner = self.inner.lock();
            match inner.on_watch.take() {
                Some((k, cmd)) if k == key => Some(cmd),
                other => {
                    inner.on_watch = other;
                    None
                }
            }
        };
        if let Some(cmd) = interfering {
            self.data.exec(cmd).await?;
        }
        Ok(FakeWatch {
            store: self.clone(),
            watch,
        })
    }

    async fn reconnect(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Reconnect);
        inner.reconnects += 1;
        Ok(())
    }
}

/// Watch opened on a [`FakeStore`]
pub struct FakeWatch {
    store: FakeStore,
    watch: MemoryWatch,
}

#[async_trait]
impl WatchSession for FakeWatch {
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError> {
        self.store.record(StoreCall::Exec(command.clone()))?;
        self.watch.exec(command).await
    }

    async fn commit(self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError> {
        self.store.record(StoreCall::Commit(commands.clone()))?;
        self.watch.commit(commands).await
    }

    async fn unwatch(self) -> Result<(), StoreError> {
        self.watch.unwatch().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
