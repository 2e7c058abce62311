// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission of on-demand repository requests.
//!
//! For each request the controller decides whether the repository can be
//! served, is already being cloned, or needs a clone scheduled:
//!
//! ```text
//! probe disk ──cloned──► AlreadyCloned
//!     │
//!     ├─ auto-clone disabled ──► Rejected
//!     ├─ registry has record ──► CloneInProgress
//!     └─ schedule job ──ok──► Scheduled / ──err──► Rejected
//! ```
//!
//! A clone may start between the registry check and scheduling. That race is
//! accepted: the job store deduplicates equivalent requests, so the worst case
//! is a redundant scheduling call.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cg_adapters::{CloneProbe, JobScheduler};
use cg_core::{AdmissionDecision, CloneDir, CloneOptions, RejectReason, RepoName, SchedulingRequest};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::locker::RepositoryLocker;

/// Source of the "auto-clone disabled" switch, consulted on every decision
pub trait AutoClonePolicy: Send + Sync + 'static {
    fn auto_clone_disabled(&self) -> bool;
}

/// In-process switch that can be flipped at runtime
#[derive(Clone, Debug, Default)]
pub struct AutoCloneSwitch {
    disabled: Arc<AtomicBool>,
}

impl AutoCloneSwitch {
    pub fn enabled() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            disabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }
}

impl AutoClonePolicy for AutoCloneSwitch {
    fn auto_clone_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }
}

/// What to do when clone state cannot be determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Reject the request with the probe error
    #[default]
    Surface,
    /// Log the error and continue as if the repository were missing
    AssumeNotCloned,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown probe failure policy {0:?} (expected \"surface\" or \"assume-not-cloned\")")]
pub struct ParsePolicyError(pub String);

impl FromStr for ProbeFailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "assume-not-cloned" => Ok(Self::AssumeNotCloned),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Decides, per request, whether to serve, report progress, or schedule a clone.
///
/// The controller only reads the registry; the worker that runs a clone owns
/// the registry record for its duration.
pub struct AdmissionController<P, S, T> {
    repos_root: PathBuf,
    probe: P,
    scheduler: S,
    toggle: T,
    locker: RepositoryLocker,
    probe_failure: ProbeFailurePolicy,
}

impl<P, S, T> AdmissionController<P, S, T>
where
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    pub fn new(
        repos_root: impl Into<PathBuf>,
        probe: P,
        scheduler: S,
        toggle: T,
        locker: RepositoryLocker,
    ) -> Self {
        Self {
            repos_root: repos_root.into(),
            probe,
            scheduler,
            toggle,
            locker,
            probe_failure: ProbeFailurePolicy::default(),
        }
    }

    pub fn with_probe_failure_policy(mut self, policy: ProbeFailurePolicy) -> Self {
        self.probe_failure = policy;
        self
    }

    pub fn repos_root(&self) -> &Path {
        &self.repos_root
    }

    pub fn locker(&self) -> &RepositoryLocker {
        &self.locker
    }

    pub fn clone_dir(&self, repo: &RepoName) -> CloneDir {
        CloneDir::for_repo(&self.repos_root, repo)
    }

    /// Decide what to do about a request for `repo`.
    ///
    /// If `cancel` fires while the probe or scheduler is in flight, the call
    /// is abandoned and `Rejected { Cancelled }` is returned. The registry is
    /// never modified here.
    pub async fn admit(&self, repo: &RepoName, cancel: &CancellationToken) -> AdmissionDecision {
        let dir = self.clone_dir(repo);

        let Some(probed) = until_cancelled(cancel, self.probe.is_cloned(&dir)).await else {
            debug!(%repo, "admission cancelled while probing clone state");
            return AdmissionDecision::rejected(RejectReason::Cancelled);
        };
        match probed {
            Ok(true) => return AdmissionDecision::AlreadyCloned,
            Ok(false) => {}
            Err(e) => match self.probe_failure {
                ProbeFailurePolicy::Surface => {
                    warn!(%repo, error = %e, "failed to determine clone state");
                    return AdmissionDecision::rejected(RejectReason::ProbeFailed {
                        message: e.to_string(),
                    });
                }
                ProbeFailurePolicy::AssumeNotCloned => {
                    warn!(
                        %repo,
                        error = %e,
                        "failed to determine clone state, assuming not cloned"
                    );
                }
            },
        }

        if self.toggle.auto_clone_disabled() {
            debug!(%repo, "not cloning on demand as auto-clone is disabled");
            return AdmissionDecision::rejected(RejectReason::AutoCloneDisabled);
        }

        if let Some(progress) = self.locker.status(&dir) {
            return AdmissionDecision::CloneInProgress { progress };
        }

        let req = SchedulingRequest::new(repo.clone(), CloneOptions::default());
        match until_cancelled(cancel, self.scheduler.schedule(req)).await {
            None => {
                debug!(%repo, "admission cancelled while scheduling clone");
                AdmissionDecision::rejected(RejectReason::Cancelled)
            }
            Some(Err(e)) => {
                warn!(%repo, error = %e, "error scheduling a repo clone");
                AdmissionDecision::rejected(RejectReason::SchedulingFailed {
                    message: e.to_string(),
                })
            }
            Some(Ok(scheduled)) => {
                info!(
                    %repo,
                    job_id = %scheduled.job_id,
                    created = scheduled.created,
                    "clone scheduled on demand"
                );
                AdmissionDecision::Scheduled {
                    progress: String::new(),
                }
            }
        }
    }
}

/// Run `fut` unless `cancel` fires first; the losing future is dropped.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
