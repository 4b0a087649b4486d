// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis-backed store

use crate::{Command, Reply, Store, StoreError, WatchSession};
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::{Connection, MultiplexedConnection};
use redis::{Client, RedisError, Value};
use std::sync::Arc;

/// Idle dedicated connections kept for watches.
const WATCH_POOL_SIZE: usize = 2;

/// Bounded free-list. Items returned past capacity are dropped.
struct IdlePool<T> {
    items: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T> IdlePool<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    fn take(&self) -> Option<T> {
        self.items.lock().pop()
    }

    fn put(&self, item: T) {
        let mut items = self.items.lock();
        if items.len() < self.capacity {
            items.push(item);
        }
    }

    fn clear(&self) {
        self.items.lock().clear();
    }
}

/// [`Store`] over a Redis server.
///
/// Plain commands and transactions share one multiplexed connection. `WATCH`
/// state is per connection, so each watch borrows a dedicated connection
/// from a small idle pool and hands it back after `EXEC` or `UNWATCH`.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    conn: Arc<Mutex<MultiplexedConnection>>,
    idle: Arc<IdlePool<Connection>>,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| map_error(e, None))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| map_error(e, None))?;
        tracing::info!(url, "connected to store");
        Ok(Self {
            client,
            conn: Arc::new(Mutex::new(conn)),
            idle: Arc::new(IdlePool::new(WATCH_POOL_SIZE)),
        })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.lock().clone()
    }

    async fn dedicated(&self) -> Result<Connection, StoreError> {
        let pooled = self.idle.take();
        match pooled {
            Some(conn) => Ok(conn),
            None => self
                .client
                .get_async_connection()
                .await
                .map_err(|e| map_error(e, None)),
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    type Watch = RedisWatch;

    async fn exec(&self, command: Command) -> Result<Reply, StoreError> {
        let key = command.key().to_string();
        let mut conn = self.conn();
        let value: Value = to_cmd(command)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_error(e, Some(&key)))?;
        Ok(to_reply(value))
    }

    async fn multi(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            pipe.add_command(to_cmd(command));
        }
        let mut conn = self.conn();
        let values: Vec<Value> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| map_error(e, None))?;
        Ok(values.into_iter().map(to_reply).collect())
    }

    async fn watch(&self, key: &str) -> Result<RedisWatch, StoreError> {
        let mut conn = self.dedicated().await?;
        redis::cmd("WATCH")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| map_error(e, Some(key)))?;
        Ok(RedisWatch {
            conn,
            key: key.to_string(),
            idle: Arc::clone(&self.idle),
        })
    }

    async fn reconnect(&self) -> Result<(), StoreError> {
        let fresh = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| map_error(e, None))?;
        *self.conn.lock() = fresh;
        self.idle.clear();
        tracing::info!("store connection re-established");
        Ok(())
    }
}

/// Connection holding a `WATCH` on one key.
///
/// Dropped without `commit` or `unwatch`, or after an error, the connection
/// is closed rather than pooled.
pub struct RedisWatch {
    conn: Connection,
    key: String,
    idle: Arc<IdlePool<Connection>>,
}

impl RedisWatch {
    /// Hand the connection back once it holds no watch.
    fn release(self) {
        self.idle.put(self.conn);
    }
}

#[async_trait]
impl WatchSession for RedisWatch {
    async fn exec(&mut self, command: Command) -> Result<Reply, StoreError> {
        let value: Value = to_cmd(command)
            .query_async(&mut self.conn)
            .await
            .map_err(|e| map_error(e, Some(&self.key)))?;
        Ok(to_reply(value))
    }

    async fn commit(mut self, commands: Vec<Command>) -> Result<Option<Vec<Reply>>, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            pipe.add_command(to_cmd(command));
        }
        // EXEC replies nil when the watched key changed
        let values: Option<Vec<Value>> = pipe
            .query_async(&mut self.conn)
            .await
            .map_err(|e| map_error(e, Some(&self.key)))?;
        self.release();
        Ok(values.map(|v| v.into_iter().map(to_reply).collect()))
    }

    async fn unwatch(mut self) -> Result<(), StoreError> {
        redis::cmd("UNWATCH")
            .query_async::<_, ()>(&mut self.conn)
            .await
            .map_err(|e| map_error(e, Some(&self.key)))?;
        self.release();
        Ok(())
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn to_cmd(command: Command) -> redis::Cmd {
    let mut cmd = redis::cmd(command.name());
    match command {
        Command::LRange { key } => {
            cmd.arg(key).arg(0).arg(-1);
        }
        Command::RPush { key, value } | Command::LPush { key, value } => {
            cmd.arg(key).arg(value);
        }
        Command::LRem { key, value } => {
            cmd.arg(key).arg(0).arg(value);
        }
        Command::RPop { key } | Command::Exists { key } | Command::Get { key } | Command::Del { key } => {
            cmd.arg(key);
        }
        Command::HGet { key, field } => {
            cmd.arg(key).arg(field);
        }
        Command::HSet { key, fields } => {
            cmd.arg(key);
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
        }
        Command::HIncrBy { key, field, by } => {
            cmd.arg(key).arg(field).arg(by);
        }
        Command::Expire { key, ttl } => {
            cmd.arg(key).arg(millis(ttl));
        }
        Command::Set {
            key,
            value,
            ttl,
            only_if_absent,
        } => {
            cmd.arg(key).arg(value);
            if only_if_absent {
                cmd.arg("NX");
            }
            if let Some(ttl) = ttl {
                cmd.arg("PX").arg(millis(ttl));
            }
        }
    }
    cmd
}

fn to_reply(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Nil,
        Value::Okay => Reply::Ok,
        Value::Status(s) if s == "OK" => Reply::Ok,
        Value::Status(s) => Reply::Bulk(s),
        Value::Int(n) => Reply::Int(n),
        Value::Data(bytes) => Reply::Bulk(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Bulk(items) => Reply::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Data(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Value::Status(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
    }
}

fn map_error(e: RedisError, key: Option<&str>) -> StoreError {
    match e.code() {
        Some("READONLY") => StoreError::ReadOnly,
        Some("WRONGTYPE") => StoreError::WrongType(key.unwrap_or_default().to_string()),
        _ if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() => {
            StoreError::Connection(e.to_string())
        }
        _ => StoreError::Command(e.to_string()),
    }
}

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;
