// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission decisions produced for each on-demand repository request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of admitting a single repository request.
///
/// Produced once per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// A complete clone already exists on disk
    AlreadyCloned,
    /// A worker is cloning the repository right now
    CloneInProgress { progress: String },
    /// A clone job was durably enqueued
    Scheduled { progress: String },
    /// No clone will be attempted for this request
    Rejected { reason: RejectReason },
}

impl AdmissionDecision {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Policy: on-demand cloning is switched off
    AutoCloneDisabled,
    /// The on-disk clone state could not be determined
    ProbeFailed { message: String },
    /// The durable job store refused the clone request
    SchedulingFailed { message: String },
    /// The caller went away before a decision was reached
    Cancelled,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoCloneDisabled => f.write_str("auto-clone disabled"),
            Self::ProbeFailed { message } => write!(f, "probe failed: {}", message),
            Self::SchedulingFailed { message } => write!(f, "scheduling failed: {}", message),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
