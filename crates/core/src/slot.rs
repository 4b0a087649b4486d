// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker slots and the partition of a job's slots across peers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One worker unit of a job, in `[0, desired_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotId {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

/// This process's position among its peers at one heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Membership {
    /// Ordinal index, `None` until this process has been registered.
    pub index: Option<u32>,
    /// Length of the membership list.
    pub peer_count: u32,
}

impl Membership {
    pub fn new(index: Option<u32>, peer_count: u32) -> Self {
        Self { index, peer_count }
    }

    /// Slots of a job with `desired` workers owned at this position.
    ///
    /// An unregistered process owns nothing.
    pub fn owned_slots(&self, desired: u32) -> BTreeSet<SlotId> {
        match self.index {
            Some(index) => owned_slots(index, self.peer_count, desired),
            None => BTreeSet::new(),
        }
    }
}

/// Slots `i` in `[0, desired)` with `i mod peer_count == index`.
///
/// Empty when `peer_count` is zero.
pub fn owned_slots(index: u32, peer_count: u32, desired: u32) -> BTreeSet<SlotId> {
    if peer_count == 0 {
        return BTreeSet::new();
    }
    (0..desired)
        .filter(|i| i % peer_count == index)
        .map(SlotId)
        .collect()
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
