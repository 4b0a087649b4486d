// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store commands and replies.

use crate::StoreError;
use std::time::Duration;

/// One key-value store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Whole list, head to tail.
    LRange { key: String },
    RPush { key: String, value: String },
    LPush { key: String, value: String },
    /// Remove every occurrence of `value`.
    LRem { key: String, value: String },
    RPop { key: String },
    HGet { key: String, field: String },
    HSet { key: String, fields: Vec<(String, String)> },
    HIncrBy { key: String, field: String, by: i64 },
    Exists { key: String },
    Expire { key: String, ttl: Duration },
    Get { key: String },
    Set {
        key: String,
        value: String,
        ttl: Option<Duration>,
        only_if_absent: bool,
    },
    Del { key: String },
}

impl Command {
    pub fn lrange(key: impl Into<String>) -> Self {
        Self::LRange { key: key.into() }
    }

    pub fn rpush(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::RPush {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn lpush(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::LPush {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn lrem(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::LRem {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn rpop(key: impl Into<String>) -> Self {
        Self::RPop { key: key.into() }
    }

    pub fn hget(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::HGet {
            key: key.into(),
            field: field.into(),
        }
    }

    pub fn hset(key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self::HSet {
            key: key.into(),
            fields,
        }
    }

    pub fn hincrby(key: impl Into<String>, field: impl Into<String>, by: i64) -> Self {
        Self::HIncrBy {
            key: key.into(),
            field: field.into(),
            by,
        }
    }

    pub fn exists(key: impl Into<String>) -> Self {
        Self::Exists { key: key.into() }
    }

    pub fn expire(key: impl Into<String>, ttl: Duration) -> Self {
        Self::Expire {
            key: key.into(),
            ttl,
        }
    }

    pub fn get(key: impl Into<String>) -> Self {
        Self::Get { key: key.into() }
    }

    /// `SET key value [PX ttl]`
    pub fn set(key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl,
            only_if_absent: false,
        }
    }

    /// `SET key value NX PX ttl`
    pub fn set_nx(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl: Some(ttl),
            only_if_absent: true,
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self::Del { key: key.into() }
    }

    /// Command name as the store spells it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LRange { .. } => "LRANGE",
            Self::RPush { .. } => "RPUSH",
            Self::LPush { .. } => "LPUSH",
            Self::LRem { .. } => "LREM",
            Self::RPop { .. } => "RPOP",
            Self::HGet { .. } => "HGET",
            Self::HSet { .. } => "HSET",
            Self::HIncrBy { .. } => "HINCRBY",
            Self::Exists { .. } => "EXISTS",
            Self::Expire { .. } => "PEXPIRE",
            Self::Get { .. } => "GET",
            Self::Set { .. } => "SET",
            Self::Del { .. } => "DEL",
        }
    }

    /// The single key this command touches.
    pub fn key(&self) -> &str {
        match self {
            Self::LRange { key }
            | Self::RPush { key, .. }
            | Self::LPush { key, .. }
            | Self::LRem { key, .. }
            | Self::RPop { key }
            | Self::HGet { key, .. }
            | Self::HSet { key, .. }
            | Self::HIncrBy { key, .. }
            | Self::Exists { key }
            | Self::Expire { key, .. }
            | Self::Get { key }
            | Self::Set { key, .. }
            | Self::Del { key } => key,
        }
    }

    /// The same command with `prefix` in front of its key.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        let key = match &mut self {
            Self::LRange { key }
            | Self::RPush { key, .. }
            | Self::LPush { key, .. }
            | Self::LRem { key, .. }
            | Self::RPop { key }
            | Self::HGet { key, .. }
            | Self::HSet { key, .. }
            | Self::HIncrBy { key, .. }
            | Self::Exists { key }
            | Self::Expire { key, .. }
            | Self::Get { key }
            | Self::Set { key, .. }
            | Self::Del { key } => key,
        };
        key.insert_str(0, prefix);
        self
    }
}

/// Reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Ok,
    Int(i64),
    Bulk(String),
    List(Vec<String>),
}

impl Reply {
    pub fn into_int(self) -> Result<i64, StoreError> {
        match self {
            Self::Int(n) => Ok(n),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Bulk string, `None` for nil.
    pub fn into_opt_string(self) -> Result<Option<String>, StoreError> {
        match self {
            Self::Bulk(s) => Ok(Some(s)),
            Self::Nil => Ok(None),
            other => Err(other.unexpected("bulk string")),
        }
    }

    pub fn into_list(self) -> Result<Vec<String>, StoreError> {
        match self {
            Self::List(items) => Ok(items),
            Self::Nil => Ok(Vec::new()),
            other => Err(other.unexpected("list")),
        }
    }

    /// Whether a conditional write took effect.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    fn unexpected(self, expected: &'static str) -> StoreError {
        StoreError::UnexpectedReply {
            expected,
            reply: format!("{:?}", self),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
