// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clone jobs and the requests that create them.

use serde::{Deserialize, Serialize};

use crate::RepoName;

crate::define_id! {
    /// Identifier of a durably recorded clone job.
    pub struct CloneJobId("cln-");
}

/// Options for scheduling a clone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Replace an existing clone instead of skipping it
    pub overwrite: bool,
}

/// Request handed to the job scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub repo: RepoName,
    pub overwrite: bool,
}

impl SchedulingRequest {
    pub fn new(repo: RepoName, opts: CloneOptions) -> Self {
        Self {
            repo,
            overwrite: opts.overwrite,
        }
    }
}

/// Lifecycle of a clone job in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneJobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    /// Dropped without running (already cloned, or a clone was in flight)
    Skipped,
}

impl CloneJobStatus {
    /// Queued and running jobs count as live for deduplication
    pub fn is_live(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

crate::simple_display! {
    CloneJobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// A clone job as recorded in the durable store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneJob {
    pub id: CloneJobId,
    pub repo: RepoName,
    pub overwrite: bool,
    pub status: CloneJobStatus,
    pub created_at_ms: u64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl CloneJob {
    pub fn new(id: CloneJobId, req: SchedulingRequest, created_at_ms: u64) -> Self {
        Self {
            id,
            repo: req.repo,
            overwrite: req.overwrite,
            status: CloneJobStatus::Queued,
            created_at_ms,
            attempts: 0,
            last_error: None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
