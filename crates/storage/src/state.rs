// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job state rebuilt from store events.

use cg_core::{CloneJob, CloneJobId, CloneJobStatus, RepoName};
use serde::{Deserialize, Serialize};

/// Terminal jobs kept in memory for status queries
const RECENT_TERMINAL_LIMIT: usize = 100;

/// A single mutation of the job store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Created { job: CloneJob },
    OverwriteRequested { id: CloneJobId },
    Started { id: CloneJobId },
    Completed { id: CloneJobId },
    Failed { id: CloneJobId, error: String },
    Skipped { id: CloneJobId, reason: String },
    /// Running job put back in the queue after a crash
    Requeued { id: CloneJobId },
}

/// Jobs in creation order
#[derive(Debug, Default, Clone)]
pub struct JobState {
    jobs: Vec<CloneJob>,
}

impl JobState {
    pub fn jobs(&self) -> &[CloneJob] {
        &self.jobs
    }

    pub fn get(&self, id: &CloneJobId) -> Option<&CloneJob> {
        self.jobs.iter().find(|j| j.id == *id)
    }

    /// The queued or running job for a repository, if any
    pub fn live_for(&self, repo: &RepoName) -> Option<&CloneJob> {
        self.jobs.iter().find(|j| j.repo == *repo && j.status.is_live())
    }

    /// Oldest queued job
    pub fn next_queued(&self) -> Option<&CloneJob> {
        self.jobs.iter().find(|j| j.status == CloneJobStatus::Queued)
    }

    pub fn count(&self, status: CloneJobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }

    fn get_mut(&mut self, id: &CloneJobId) -> Option<&mut CloneJob> {
        self.jobs.iter_mut().find(|j| j.id == *id)
    }

    /// Apply an event. Idempotent: replaying an event twice leaves the same state.
    pub fn apply(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::Created { job } => {
                if self.get(&job.id).is_none() {
                    self.jobs.push(job.clone());
                }
            }

            StoreEvent::OverwriteRequested { id } => {
                if let Some(job) = self.get_mut(id) {
                    job.overwrite = true;
                }
            }

            StoreEvent::Started { id } => {
                if let Some(job) = self.get_mut(id) {
                    if job.status == CloneJobStatus::Queued {
                        job.status = CloneJobStatus::Running;
                        job.attempts += 1;
                    }
                }
            }

            StoreEvent::Completed { id } => {
                self.finish(id, CloneJobStatus::Completed, None);
            }

            StoreEvent::Failed { id, error } => {
                self.finish(id, CloneJobStatus::Failed, Some(error));
            }

            StoreEvent::Skipped { id, reason } => {
                self.finish(id, CloneJobStatus::Skipped, Some(reason));
            }

            StoreEvent::Requeued { id } => {
                if let Some(job) = self.get_mut(id) {
                    if job.status == CloneJobStatus::Running {
                        job.status = CloneJobStatus::Queued;
                    }
                }
            }
        }
    }

    fn finish(&mut self, id: &CloneJobId, status: CloneJobStatus, note: Option<&String>) {
        if let Some(job) = self.get_mut(id) {
            job.status = status;
            job.last_error = note.cloned();
        }
        self.prune_terminal();
    }

    /// Drop the oldest terminal jobs beyond the retention limit.
    fn prune_terminal(&mut self) {
        let terminal = self.jobs.iter().filter(|j| !j.status.is_live()).count();
        let mut excess = terminal.saturating_sub(RECENT_TERMINAL_LIMIT);
        if excess == 0 {
            return;
        }
        self.jobs.retain(|j| {
            if excess > 0 && !j.status.is_live() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Events that recreate the live jobs and nothing else
    pub(crate) fn compacted_events(&self) -> Vec<StoreEvent> {
        self.jobs
            .iter()
            .filter(|j| j.status.is_live())
            .map(|j| StoreEvent::Created { job: j.clone() })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
