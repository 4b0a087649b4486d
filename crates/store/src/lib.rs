// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared key-value store capability used for coordination.
//!
//! The balancer needs single commands, atomic multi-command transactions and
//! an optimistic "watch a key, read, commit unless it changed" primitive.

mod command;
mod memory;
pub mod namespaced;
#[cfg(feature = "redis")]
mod redis;
pub mod traced;

pub use command::{Command, Reply};
pub use memory::{MemoryStore, MemoryWatch};
pub use namespaced::{NamespacedStore, NamespacedWatch};
#[cfg(feature = "redis")]
pub use redis::{RedisStore, RedisWatch};
pub use traced::{TracedStore, TracedWatch};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, FakeWatch, StoreCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The connected node is a read-only replica.
    #[error("READONLY: connected to a read-only replica")]
    ReadOnly,
    #[error("WRONGTYPE: key {0} holds the wrong kind of value")]
    WrongType(String),
    #[error("unexpected reply, expected {expected}: {reply}")]
    UnexpectedReply { expected: &'static str, reply: String },
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("command failed: {0}")]
    Command(String),
}

/// Client for the shared key-value store.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Watch: WatchSession;

    /// Run one command.
    async fn exec(&self, command: Command) -> Result<Reply, StoreError>;

    /// Run commands as one atomic transaction.
    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError>;

    /// Start watching `key` for an optimistic transaction.
    async fn watch(&self, key: &str) -> Result<Self::Watch, StoreError>;

    /// Drop and re-establish the connection.
    async fn reconnect(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A watch opened by [`Store::watch`].
#[async_trait]
pub trait WatchSession: Send + 'static {
    /// Run a command inside the watch (typically a read of the watched key).
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError>;

    /// Run `commands` atomically unless the watched key changed since the
    /// watch was opened, in which case nothing runs and `None` is returned.
    async fn commit(self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError>;

    /// Release the watch without writing.
    async fn unwatch(self) -> Result<(), StoreError>;
}
