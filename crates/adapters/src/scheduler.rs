// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job scheduling: durably enqueue a clone request for the worker.

use std::sync::Arc;

use async_trait::async_trait;
use cg_core::{Clock, CloneJobId, SchedulingRequest, SystemClock};
use cg_storage::{JobStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from scheduling a clone
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("job store error: {0}")]
    Store(#[from] StoreError),
    #[error("job store task failed: {0}")]
    Join(String),
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a successful scheduling call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub job_id: CloneJobId,
    /// False when an equivalent job was already queued or running
    pub created: bool,
}

/// Records clone requests for asynchronous execution.
///
/// Returns once the request is durable; never waits for the clone itself.
/// Equivalent requests may arrive more than once and must not produce
/// duplicate concurrent jobs.
#[async_trait]
pub trait JobScheduler: Clone + Send + Sync + 'static {
    async fn schedule(&self, req: SchedulingRequest) -> Result<Scheduled, ScheduleError>;
}

/// Scheduler backed by the durable [`JobStore`]
pub struct StoreScheduler<C: Clock = SystemClock> {
    store: Arc<JobStore<C>>,
}

impl<C: Clock> StoreScheduler<C> {
    pub fn new(store: Arc<JobStore<C>>) -> Self {
        Self { store }
    }
}

impl<C: Clock> Clone for StoreScheduler<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl<C: Clock> JobScheduler for StoreScheduler<C> {
    async fn schedule(&self, req: SchedulingRequest) -> Result<Scheduled, ScheduleError> {
        let store = Arc::clone(&self.store);
        let repo = req.repo.clone();
        // File append + fsync; keep it off the async workers
        let (job, created) = tokio::task::spawn_blocking(move || store.create(req))
            .await
            .map_err(|e| ScheduleError::Join(e.to_string()))??;

        if created {
            info!(%repo, job_id = %job.id, "scheduled clone");
        } else {
            debug!(%repo, job_id = %job.id, status = %job.status, "clone already scheduled");
        }
        Ok(Scheduled {
            job_id: job.id,
            created,
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{JobScheduler, ScheduleError, Scheduled};
    use async_trait::async_trait;
    use cg_core::{CloneJobId, SchedulingRequest};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeSchedulerState {
        calls: Vec<SchedulingRequest>,
        failure: Option<String>,
        hang: bool,
    }

    /// Fake scheduler that records requests
    #[derive(Clone, Default)]
    pub struct FakeScheduler {
        inner: Arc<Mutex<FakeSchedulerState>>,
    }

    impl FakeScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate a durable store outage
        pub fn fail_with(&self, message: impl Into<String>) {
            self.inner.lock().failure = Some(message.into());
        }

        /// Make every call wait forever (for cancellation tests)
        pub fn hang(&self) {
            self.inner.lock().hang = true;
        }

        pub fn calls(&self) -> Vec<SchedulingRequest> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl JobScheduler for FakeScheduler {
        async fn schedule(&self, req: SchedulingRequest) -> Result<Scheduled, ScheduleError> {
            let (hang, result) = {
                let mut inner = self.inner.lock();
                inner.calls.push(req);
                let result = match &inner.failure {
                    Some(message) => Err(ScheduleError::Unavailable(message.clone())),
                    None => Ok(Scheduled {
                        job_id: CloneJobId::new(),
                        created: true,
                    }),
                };
                (inner.hang, result)
            };
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeScheduler;

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
