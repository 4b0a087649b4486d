// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager: process identity, heartbeat and orderly shutdown
//!
//! Every heartbeat the manager
//! 1. derives its ordinal index from the shared membership list, appending
//!    itself under a watch when absent,
//! 2. refreshes its liveness record and pops one pending remote signal,
//! 3. delivers that signal, or otherwise reconciles every job's watcher and
//!    publishes their stats.

use crate::admin::scheduled_workers;
use crate::error::EngineError;
use crate::lock::{AdvisoryBackend, AdvisoryLock, LockStrategy, StoreLock};
use crate::pool::WorkerPool;
use crate::registry::JobRegistry;
use crate::signal::{ProcessSignals, SignalDelivery};
use crate::watcher::Watcher;
use parking_lot::Mutex;
use pb_core::keys::{self, PROCESSES_KEY};
use pb_core::{Config, Identity, JobId, LockDriver, Membership, WorkerStats};
use pb_store::{Command, Reply, Store, StoreError, WatchSession};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

/// Registration attempts per heartbeat before giving up until the next one.
const INDEX_ATTEMPTS: usize = 3;

/// OS hostname, `localhost` when it cannot be read.
pub fn local_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[derive(Serialize)]
struct ProcessInfo<'a> {
    hostname: &'a str,
    pid: u32,
    identity: &'a str,
}

/// Builder for [`Manager`].
pub struct ManagerBuilder<S> {
    store: S,
    registry: JobRegistry,
    config: Config,
    hostname: Option<String>,
    identity: Option<Identity>,
    signals: Arc<dyn SignalDelivery>,
    advisory: Option<Arc<dyn LockStrategy>>,
}

impl<S: Store> ManagerBuilder<S> {
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Use a fixed identity instead of `host:pid:nonce`.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn signals(mut self, signals: impl SignalDelivery) -> Self {
        self.signals = Arc::new(signals);
        self
    }

    /// Backend for jobs configured with the advisory lock.
    pub fn advisory_locks<B: AdvisoryBackend>(mut self, backend: B) -> Self {
        self.advisory = Some(Arc::new(AdvisoryLock::new(backend)));
        self
    }

    /// Resolve every configured job's class and lock, and set up watchers.
    pub fn build(self) -> Result<Manager<S>, EngineError> {
        let Config {
            max_threads,
            shutdown_timeout,
            heartbeat_interval,
            liveness_ttl,
            jobs,
            ..
        } = self.config;

        let hostname = self.hostname.unwrap_or_else(local_hostname);
        let identity = self
            .identity
            .unwrap_or_else(|| Identity::for_process(&hostname));
        let info = serde_json::to_string(&ProcessInfo {
            hostname: &hostname,
            pid: std::process::id(),
            identity: identity.as_str(),
        })?;

        let pool = WorkerPool::new(max_threads);
        let store_lock: Arc<dyn LockStrategy> =
            Arc::new(StoreLock::new(self.store.clone(), identity.clone()));

        let mut watchers = Vec::with_capacity(jobs.len());
        for job in jobs {
            let factory = self
                .registry
                .get(&job.class)
                .ok_or_else(|| EngineError::UnknownJobClass(job.class.clone()))?;
            let lock = match job.lock {
                None => None,
                Some(LockDriver::Store) => Some(Arc::clone(&store_lock)),
                Some(LockDriver::Advisory) => Some(self.advisory.clone().ok_or_else(|| {
                    EngineError::LockDriverUnavailable {
                        job: job.id.clone(),
                        driver: LockDriver::Advisory,
                    }
                })?),
            };
            watchers.push(Watcher::new(job, factory, lock, pool.clone()));
        }

        Ok(Manager {
            inner: Arc::new(ManagerInner {
                store: self.store,
                identity,
                info,
                watchers,
                pool,
                signals: self.signals,
                heartbeat_interval,
                liveness_ttl,
                shutdown_timeout,
                quiet: AtomicBool::new(false),
                membership: Mutex::new(Membership::default()),
                heartbeat: Mutex::new(None),
            }),
        })
    }
}

/// Drives this process's share of every configured job.
#[derive(Clone)]
pub struct Manager<S> {
    inner: Arc<ManagerInner<S>>,
}

struct ManagerInner<S> {
    store: S,
    identity: Identity,
    info: String,
    watchers: Vec<Watcher>,
    pool: WorkerPool,
    signals: Arc<dyn SignalDelivery>,
    heartbeat_interval: Duration,
    liveness_ttl: Duration,
    shutdown_timeout: Duration,
    quiet: AtomicBool,
    membership: Mutex<Membership>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl<S: Store> Manager<S> {
    pub fn builder(store: S, registry: JobRegistry, config: Config) -> ManagerBuilder<S> {
        ManagerBuilder {
            store,
            registry,
            config,
            hostname: None,
            identity: None,
            signals: Arc::new(ProcessSignals),
            advisory: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Index and peer count seen by the latest heartbeat.
    pub fn membership(&self) -> Membership {
        *self.inner.membership.lock()
    }

    /// Whether `quiet()` or `stop()` has been called.
    pub fn is_stopping(&self) -> bool {
        self.inner.quiet.load(Ordering::Acquire)
    }

    pub fn watchers(&self) -> &[Watcher] {
        &self.inner.watchers
    }

    /// Latest stats snapshot of every job.
    pub fn worker_stats(&self) -> BTreeMap<JobId, WorkerStats> {
        self.inner
            .watchers
            .iter()
            .map(|w| (w.job_id().clone(), w.stats()))
            .collect()
    }

    /// Start the heartbeat task. Calling again while it runs does nothing.
    pub fn run(&self) {
        let mut slot = self.inner.heartbeat.lock();
        if slot.is_some() {
            return;
        }
        let manager = self.clone();
        let period = self.inner.heartbeat_interval.max(Duration::from_millis(1));
        let span = tracing::info_span!("heartbeat", identity = %self.inner.identity);
        *slot = Some(tokio::spawn(
            async move {
                tracing::info!(every = ?period, "heartbeat started");
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    manager.heartbeat().await;
                }
            }
            .instrument(span),
        ));
    }

    /// One heartbeat. Errors are logged; the next tick starts afresh.
    pub async fn heartbeat(&self) {
        if let Err(e) = self.try_heartbeat().await {
            tracing::error!(error = %e, "heartbeat failed");
        }
    }

    /// One heartbeat, returning the first error.
    pub async fn try_heartbeat(&self) -> Result<(), EngineError> {
        let membership = self.update_process_index().await?;
        *self.inner.membership.lock() = membership;

        if let Some(signal) = self.update_state(membership).await? {
            tracing::info!(signal = %signal, "delivering remote signal");
            self.inner.signals.deliver(&signal)?;
            return Ok(());
        }
        self.update_jobs(membership).await
    }

    /// Stop claiming slots and drain every job now, without waiting for
    /// the next heartbeat.
    pub async fn quiet(&self) {
        if !self.inner.quiet.swap(true, Ordering::AcqRel) {
            tracing::info!(identity = %self.inner.identity, "quieting, draining all workers");
        }
        if let Err(e) = self.update_jobs(self.membership()).await {
            tracing::warn!(error = %e, "failed to publish drained workers");
        }
    }

    /// Drain, wait up to the shutdown timeout for workers, kill the rest and
    /// leave the membership list. Returns the number of workers killed.
    pub async fn stop(&self) -> usize {
        self.quiet().await;
        let heartbeat = self.inner.heartbeat.lock().take();
        if let Some(handle) = heartbeat {
            handle.abort();
        }

        let killed = self.inner.pool.shutdown(self.inner.shutdown_timeout).await;
        if killed > 0 {
            tracing::warn!(killed, "killed workers still running after shutdown timeout");
        }

        let leave = Command::lrem(PROCESSES_KEY, self.inner.identity.as_str());
        if let Err(e) = self.inner.store.exec(leave).await {
            tracing::debug!(error = %e, "could not leave membership list");
        }
        tracing::info!(identity = %self.inner.identity, "stopped");
        killed
    }

    async fn update_process_index(&self) -> Result<Membership, EngineError> {
        let store = &self.inner.store;
        let me = self.inner.identity.as_str();
        let mut seen = 0;

        for attempt in 1..=INDEX_ATTEMPTS {
            let mut watch = store.watch(PROCESSES_KEY).await?;
            let members = watch.exec(Command::lrange(PROCESSES_KEY)).await?.into_list()?;
            seen = count(members.len());

            if let Some(position) = members.iter().position(|m| m == me) {
                watch.unwatch().await?;
                return Ok(Membership::new(Some(count(position)), seen));
            }

            match watch.commit(vec![Command::rpush(PROCESSES_KEY, me)]).await? {
                Some(replies) => {
                    let length = first_int(replies)?;
                    let peers = u32::try_from(length).map_err(|_| StoreError::UnexpectedReply {
                        expected: "list length",
                        reply: length.to_string(),
                    })?;
                    tracing::info!(index = peers.saturating_sub(1), peers, "joined membership list");
                    return Ok(Membership::new(peers.checked_sub(1), peers));
                }
                None => {
                    tracing::debug!(attempt, "membership changed while joining, retrying");
                }
            }
        }

        tracing::warn!(peers = seen, "could not join membership list this heartbeat");
        Ok(Membership::new(None, seen))
    }

    /// Refresh the liveness record and pop one pending signal.
    async fn update_state(&self, membership: Membership) -> Result<Option<String>, EngineError> {
        let key = keys::liveness(&self.inner.identity);
        let beat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let fields = vec![
            ("info".to_string(), self.inner.info.clone()),
            ("beat".to_string(), beat.to_string()),
            ("quiet".to_string(), self.is_stopping().to_string()),
            (
                "worker".to_string(),
                membership.index.map(|i| i.to_string()).unwrap_or_default(),
            ),
        ];

        let replies = self
            .inner
            .store
            .multi(vec![
                Command::exists(&key),
                Command::hset(&key, fields),
                Command::expire(&key, self.inner.liveness_ttl),
                Command::rpop(keys::signals(&self.inner.identity)),
            ])
            .await?;

        let mut replies = replies.into_iter();
        let existed = replies.next().map(Reply::into_int).transpose()?.unwrap_or(0) > 0;
        if !existed {
            tracing::info!("liveness record created");
        }
        let signal = replies.nth(2).map(Reply::into_opt_string).transpose()?.flatten();
        Ok(signal)
    }

    /// Reconcile every watcher and publish the stats snapshot.
    async fn update_jobs(&self, membership: Membership) -> Result<(), EngineError> {
        let quiet = self.is_stopping();
        let mut fields = Vec::with_capacity(self.inner.watchers.len());

        for watcher in &self.inner.watchers {
            let desired = if quiet {
                0
            } else {
                match scheduled_workers(&self.inner.store, watcher.job_id()).await {
                    Ok(desired) => desired,
                    Err(EngineError::InvalidWorkerCount { job, value }) => {
                        tracing::warn!(%job, %value, "unreadable worker count, running none");
                        0
                    }
                    Err(e) => return Err(e),
                }
            };
            watcher.reconcile(membership, desired);
            fields.push((
                watcher.job_id().to_string(),
                serde_json::to_string(&watcher.stats())?,
            ));
        }

        let key = keys::workers(self.inner.identity.as_str());
        let mut commands = vec![Command::del(&key)];
        if !fields.is_empty() {
            commands.push(Command::hset(&key, fields));
            commands.push(Command::expire(&key, self.inner.liveness_ttl));
        }
        self.inner.store.multi(commands).await?;
        Ok(())
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn first_int(replies: Vec<Reply>) -> Result<i64, StoreError> {
    match replies.into_iter().next() {
        Some(reply) => reply.into_int(),
        None => Err(StoreError::UnexpectedReply {
            expected: "integer",
            reply: "no reply".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
