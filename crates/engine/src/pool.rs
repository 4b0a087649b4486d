// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded pool for worker run loops

use crate::error::PoolError;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::{AbortHandle, JoinHandle};

/// Runs at most `capacity` tasks at once.
///
/// Submission never waits: a full pool rejects with
/// [`PoolError::Saturated`] and the caller retries later.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    permits: Arc<Semaphore>,
    capacity: u32,
    closed: AtomicBool,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl WorkerPool {
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(capacity as usize)),
                capacity,
                closed: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.inner.capacity
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Spawn `task` if a slot is free.
    pub fn submit<F>(&self, task: F) -> Result<JoinHandle<F::Output>, PoolError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(PoolError::ShutDown);
        }
        let permit = Arc::clone(&self.inner.permits)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::Closed => PoolError::ShutDown,
                TryAcquireError::NoPermits => PoolError::Saturated,
            })?;
        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });
        let mut tasks = self.inner.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle.abort_handle());
        Ok(handle)
    }

    /// Refuse new work, wait up to `timeout` for running tasks, then abort
    /// whatever is left. Returns the number of tasks aborted.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        self.inner.closed.store(true, Ordering::Release);
        let drained = tokio::time::timeout(
            timeout,
            self.inner.permits.acquire_many(self.inner.capacity),
        )
        .await;
        self.inner.permits.close();

        if matches!(drained, Ok(Ok(_))) {
            return 0;
        }
        let mut tasks = self.inner.tasks.lock();
        let mut killed = 0;
        for task in tasks.drain(..) {
            if !task.is_finished() {
                task.abort();
                killed += 1;
            }
        }
        killed
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
