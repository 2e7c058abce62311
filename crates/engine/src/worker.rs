// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clone worker: drains the job store and runs clones.
//!
//! The worker is the only writer of registry records. It claims the clone
//! directory before touching disk and releases it after the job outcome is
//! recorded, whatever that outcome is.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cg_adapters::{CloneExecutor, CloneProbe};
use cg_core::{Clock, CloneDir, CloneJob, CloneOptions, SystemClock};
use cg_storage::{JobStore, StoreError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::locker::{CloneLock, RepositoryLocker};

/// Default delay between polls of an empty queue
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Errors from the worker's own bookkeeping (not from clones)
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job store error: {0}")]
    Store(#[from] StoreError),
    #[error("job store task failed: {0}")]
    Join(String),
}

/// How a claimed job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Cloned,
    Skipped(String),
    Failed(String),
}

pub struct CloneWorker<P, E, C: Clock = SystemClock> {
    store: Arc<JobStore<C>>,
    locker: RepositoryLocker,
    probe: P,
    executor: E,
    repos_root: PathBuf,
    poll_interval: Duration,
}

impl<P: Clone, E: Clone, C: Clock> Clone for CloneWorker<P, E, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locker: self.locker.clone(),
            probe: self.probe.clone(),
            executor: self.executor.clone(),
            repos_root: self.repos_root.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<P, E, C> CloneWorker<P, E, C>
where
    P: CloneProbe,
    E: CloneExecutor,
    C: Clock,
{
    pub fn new(
        store: Arc<JobStore<C>>,
        locker: RepositoryLocker,
        probe: P,
        executor: E,
        repos_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            locker,
            probe,
            executor,
            repos_root: repos_root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Claim and run the oldest queued job. Returns `None` if the queue is empty.
    pub async fn run_once(&self) -> Result<Option<(CloneJob, JobOutcome)>, WorkerError> {
        let Some(job) = self.with_store(|store| store.take_next()).await? else {
            return Ok(None);
        };

        let dir = CloneDir::for_repo(&self.repos_root, &job.repo);
        let lock = self.locker.try_lock(&dir);
        let outcome = match &lock {
            None => JobOutcome::Skipped("clone already in progress".to_string()),
            Some(lock) => self.execute(&job, lock).await,
        };

        self.record(&job, &outcome).await?;
        drop(lock);

        match &outcome {
            JobOutcome::Cloned => info!(repo = %job.repo, job_id = %job.id, "clone finished"),
            JobOutcome::Skipped(reason) => {
                debug!(repo = %job.repo, job_id = %job.id, %reason, "clone skipped")
            }
            JobOutcome::Failed(err) => {
                warn!(repo = %job.repo, job_id = %job.id, error = %err, "clone failed")
            }
        }
        Ok(Some((job, outcome)))
    }

    /// Process jobs until `cancel` fires.
    ///
    /// A clone interrupted by cancellation releases its registry slot and
    /// stays running in the store; it is requeued when the store reopens.
    pub async fn run(self, cancel: CancellationToken) {
        info!(repos_root = %self.repos_root.display(), "clone worker started");
        loop {
            let idle = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.run_once() => match result {
                    Ok(Some(_)) => false,
                    Ok(None) => true,
                    Err(e) => {
                        error!(error = %e, "clone worker bookkeeping failed");
                        true
                    }
                },
            };
            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
        info!("clone worker stopped");
    }

    async fn execute(&self, job: &CloneJob, lock: &CloneLock) -> JobOutcome {
        if !job.overwrite {
            match self.probe.is_cloned(lock.dir()).await {
                Ok(true) => return JobOutcome::Skipped("already cloned".to_string()),
                Ok(false) => {}
                Err(e) => return JobOutcome::Failed(e.to_string()),
            }
        }

        info!(repo = %job.repo, job_id = %job.id, attempt = job.attempts, "cloning repository");
        let opts = CloneOptions {
            overwrite: job.overwrite,
        };
        match self.executor.clone_repo(&job.repo, lock.dir(), opts, lock).await {
            Ok(()) => JobOutcome::Cloned,
            Err(e) => JobOutcome::Failed(e.to_string()),
        }
    }

    async fn record(&self, job: &CloneJob, outcome: &JobOutcome) -> Result<(), WorkerError> {
        let id = job.id.clone();
        match outcome.clone() {
            JobOutcome::Cloned => self.with_store(move |store| store.complete(&id)).await,
            JobOutcome::Skipped(reason) => {
                self.with_store(move |store| store.skip(&id, reason)).await
            }
            JobOutcome::Failed(err) => self.with_store(move |store| store.fail(&id, err)).await,
        }
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        F: FnOnce(&JobStore<C>) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| WorkerError::Join(e.to_string()))?
            .map_err(WorkerError::from)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
