// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store with Redis-like semantics.
//!
//! Keys may carry an expiry, checked lazily against `tokio::time::Instant`
//! so tests can drive it with a paused clock. Every write bumps the key's
//! version; a watch commits only if the version it recorded is unchanged.

use crate::{Command, Reply, Store, StoreError, WatchSession};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    List(VecDeque<String>),
    Hash(BTreeMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Entry>,
    versions: HashMap<String, u64>,
    next_version: u64,
}

impl MemoryState {
    fn touch(&mut self, key: &str) {
        self.next_version += 1;
        self.versions.insert(key.to_string(), self.next_version);
    }

    fn version(&mut self, key: &str, now: Instant) -> u64 {
        self.purge_expired(key, now);
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn purge_expired(&mut self, key: &str, now: Instant) {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now);
        if expired {
            self.entries.remove(key);
            self.touch(key);
        }
    }

    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        self.purge_expired(key, now);
        self.entries.get_mut(key)
    }

    fn list_mut(&mut self, key: &str, now: Instant) -> Result<&mut VecDeque<String>, StoreError> {
        self.purge_expired(key, now);
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::List(list) => Ok(list),
            _ => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn hash_mut(
        &mut self,
        key: &str,
        now: Instant,
    ) -> Result<&mut BTreeMap<String, String>, StoreError> {
        self.purge_expired(key, now);
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(BTreeMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(hash) => Ok(hash),
            _ => Err(StoreError::WrongType(key.to_string())),
        }
    }

    /// Remove a key whose collection became empty.
    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => list.is_empty(),
            Some(Value::Hash(hash)) => hash.is_empty(),
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }

    fn apply(&mut self, command: Command, now: Instant) -> Result<Reply, StoreError> {
        match command {
            Command::LRange { key } => match self.live(&key, now).map(|e| &e.value) {
                None => Ok(Reply::List(Vec::new())),
                Some(Value::List(list)) => Ok(Reply::List(list.iter().cloned().collect())),
                Some(_) => Err(StoreError::WrongType(key)),
            },
            Command::RPush { key, value } => {
                let list = self.list_mut(&key, now)?;
                list.push_back(value);
                let len = list.len();
                self.touch(&key);
                Ok(Reply::Int(len as i64))
            }
            Command::LPush { key, value } => {
                let list = self.list_mut(&key, now)?;
                list.push_front(value);
                let len = list.len();
                self.touch(&key);
                Ok(Reply::Int(len as i64))
            }
            Command::LRem { key, value } => {
                if self.live(&key, now).is_none() {
                    return Ok(Reply::Int(0));
                }
                let list = self.list_mut(&key, now)?;
                let before = list.len();
                list.retain(|v| *v != value);
                let removed = before - list.len();
                if removed > 0 {
                    self.drop_if_empty(&key);
                    self.touch(&key);
                }
                Ok(Reply::Int(removed as i64))
            }
            Command::RPop { key } => {
                if self.live(&key, now).is_none() {
                    return Ok(Reply::Nil);
                }
                let popped = self.list_mut(&key, now)?.pop_back();
                match popped {
                    Some(value) => {
                        self.drop_if_empty(&key);
                        self.touch(&key);
                        Ok(Reply::Bulk(value))
                    }
                    None => Ok(Reply::Nil),
                }
            }
            Command::HGet { key, field } => match self.live(&key, now).map(|e| &e.value) {
                None => Ok(Reply::Nil),
                Some(Value::Hash(hash)) => Ok(hash
                    .get(&field)
                    .map_or(Reply::Nil, |v| Reply::Bulk(v.clone()))),
                Some(_) => Err(StoreError::WrongType(key)),
            },
            Command::HSet { key, fields } => {
                let hash = self.hash_mut(&key, now)?;
                let mut added = 0;
                for (field, value) in fields {
                    if hash.insert(field, value).is_none() {
                        added += 1;
                    }
                }
                self.drop_if_empty(&key);
                self.touch(&key);
                Ok(Reply::Int(added))
            }
            Command::HIncrBy { key, field, by } => {
                let hash = self.hash_mut(&key, now)?;
                let current = match hash.get(&field) {
                    Some(v) => v.parse::<i64>().map_err(|_| {
                        StoreError::Command("hash value is not an integer".to_string())
                    })?,
                    None => 0,
                };
                let next = current
                    .checked_add(by)
                    .ok_or_else(|| StoreError::Command("increment would overflow".to_string()))?;
                hash.insert(field, next.to_string());
                self.touch(&key);
                Ok(Reply::Int(next))
            }
            Command::Exists { key } => Ok(Reply::Int(i64::from(self.live(&key, now).is_some()))),
            Command::Expire { key, ttl } => match self.live(&key, now) {
                Some(entry) => {
                    entry.expires_at = now.checked_add(ttl);
                    self.touch(&key);
                    Ok(Reply::Int(1))
                }
                None => Ok(Reply::Int(0)),
            },
            Command::Get { key } => match self.live(&key, now).map(|e| &e.value) {
                None => Ok(Reply::Nil),
                Some(Value::Str(s)) => Ok(Reply::Bulk(s.clone())),
                Some(_) => Err(StoreError::WrongType(key)),
            },
            Command::Set {
                key,
                value,
                ttl,
                only_if_absent,
            } => {
                if only_if_absent && self.live(&key, now).is_some() {
                    return Ok(Reply::Nil);
                }
                self.entries.insert(
                    key.clone(),
                    Entry {
                        value: Value::Str(value),
                        expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
                    },
                );
                self.touch(&key);
                Ok(Reply::Ok)
            }
            Command::Del { key } => match self.live(&key, now) {
                Some(_) => {
                    self.entries.remove(&key);
                    self.touch(&key);
                    Ok(Reply::Int(1))
                }
                None => Ok(Reply::Int(0)),
            },
        }
    }

    fn apply_all(&mut self, commands: Vec<Command>, now: Instant) -> Result<Vec<Reply>, StoreError> {
        commands.into_iter().map(|c| self.apply(c, now)).collect()
    }
}

/// In-process [`Store`]; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time to live of `key`, `None` if absent or persistent.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.inner.lock();
        state
            .live(key, now)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn run(&self, command: Command) -> Result<Reply, StoreError> {
        self.inner.lock().apply(command, Instant::now())
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Watch = MemoryWatch;

    async fn exec(&self, command: Command) -> Result<Reply, StoreError> {
        self.run(command)
    }

    /// Commands run under one lock. A failing command stops the transaction;
    /// earlier commands stay applied.
    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        self.inner.lock().apply_all(commands, Instant::now())
    }

    async fn watch(&self, key: &str) -> Result<MemoryWatch, StoreError> {
        let version = self.inner.lock().version(key, Instant::now());
        Ok(MemoryWatch {
            store: self.clone(),
            key: key.to_string(),
            version,
        })
    }
}

/// Watch on one key of a [`MemoryStore`].
pub struct MemoryWatch {
    store: MemoryStore,
    key: String,
    version: u64,
}

#[async_trait]
impl WatchSession for MemoryWatch {
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError> {
        self.store.run(command)
    }

    async fn commit(self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError> {
        let now = Instant::now();
        let mut state = self.store.inner.lock();
        if state.version(&self.key, now) != self.version {
            return Ok(None);
        }
        state.apply_all(commands, now).map(Some)
    }

    async fn unwatch(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
