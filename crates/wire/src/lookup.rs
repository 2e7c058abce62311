// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository lookup payload and its mapping from admission decisions.

use cg_core::{AdmissionDecision, RejectReason};
use serde::{Deserialize, Serialize};

/// Result of a repository lookup as seen by clients.
///
/// A repository that is being fetched is still reported as not found, with
/// `clone_in_progress` set. That includes a clone scheduled by this very
/// request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoLookup {
    pub not_found: bool,
    #[serde(default)]
    pub clone_in_progress: bool,
    #[serde(default)]
    pub clone_progress: String,
}

impl RepoLookup {
    pub fn found() -> Self {
        Self::default()
    }
}

impl From<&AdmissionDecision> for RepoLookup {
    fn from(decision: &AdmissionDecision) -> Self {
        match decision {
            AdmissionDecision::AlreadyCloned => Self::found(),
            AdmissionDecision::CloneInProgress { progress }
            | AdmissionDecision::Scheduled { progress } => Self {
                not_found: true,
                clone_in_progress: true,
                clone_progress: progress.clone(),
            },
            AdmissionDecision::Rejected { reason } => match reason {
                RejectReason::AutoCloneDisabled
                | RejectReason::SchedulingFailed { .. }
                | RejectReason::ProbeFailed { .. }
                | RejectReason::Cancelled => Self {
                    not_found: true,
                    clone_in_progress: false,
                    clone_progress: String::new(),
                },
            },
        }
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod tests;
