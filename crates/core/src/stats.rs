// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job worker stats published by each process every heartbeat.

use crate::slot::SlotId;
use serde::{Deserialize, Serialize};

/// One entry of a stats list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub id: SlotId,
}

/// `{"running":[{"id":0}],"stopping":[{"id":1}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    #[serde(default)]
    pub running: Vec<SlotEntry>,
    #[serde(default)]
    pub stopping: Vec<SlotEntry>,
}

impl WorkerStats {
    pub fn new(
        running: impl IntoIterator<Item = SlotId>,
        stopping: impl IntoIterator<Item = SlotId>,
    ) -> Self {
        Self {
            running: running.into_iter().map(|id| SlotEntry { id }).collect(),
            stopping: stopping.into_iter().map(|id| SlotEntry { id }).collect(),
        }
    }

    pub fn running_ids(&self) -> Vec<SlotId> {
        self.running.iter().map(|e| e.id).collect()
    }

    pub fn stopping_ids(&self) -> Vec<SlotId> {
        self.stopping.iter().map(|e| e.id).collect()
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
