// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job class registry
//!
//! Job configurations name their implementation by class string. The
//! embedding process registers a factory per class before the manager
//! starts; nothing is looked up by reflection.

use crate::error::JobError;
use crate::job::{BatchJob, BatchRunner, Job};
use crate::lock::LockStrategy;
use pb_core::{JobConfig, SlotId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything a factory gets to build the job for one slot.
#[derive(Clone)]
pub struct JobInit {
    pub slot: SlotId,
    pub config: Arc<JobConfig>,
    /// Worker lock selected by the job's configuration, if any.
    pub lock: Option<Arc<dyn LockStrategy>>,
}

pub type JobFactory = Arc<dyn Fn(JobInit) -> Result<Box<dyn Job>, JobError> + Send + Sync>;

/// Maps job class names to factories.
#[derive(Clone, Default)]
pub struct JobRegistry {
    factories: HashMap<String, JobFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory producing any [`Job`].
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(JobInit) -> Result<Box<dyn Job>, JobError> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
        self
    }

    /// Register a [`BatchJob`]; each instance runs inside a [`BatchRunner`].
    pub fn register_batch<J, F>(&mut self, class: impl Into<String>, factory: F) -> &mut Self
    where
        J: BatchJob,
        F: Fn(&JobInit) -> Result<J, JobError> + Send + Sync + 'static,
    {
        self.register(class, move |init: JobInit| {
            let job = factory(&init)?;
            Ok(Box::new(BatchRunner::new(job, init)) as Box<dyn Job>)
        })
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    pub fn get(&self, class: &str) -> Option<JobFactory> {
        self.factories.get(class).cloned()
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.factories.keys().collect();
        classes.sort();
        f.debug_struct("JobRegistry").field("classes", &classes).finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
