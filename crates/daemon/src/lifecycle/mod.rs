// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use cg_adapters::{FsCloneProbe, GitCloneExecutor, StoreScheduler};
use cg_engine::{AdmissionController, CloneWorker};
use cg_storage::{JobStore, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env::EnvAutoClone;

/// Admission controller with the daemon's concrete collaborators
pub type DaemonController = AdmissionController<FsCloneProbe, StoreScheduler, EnvAutoClone>;

/// Clone worker with the daemon's concrete collaborators
pub type DaemonWorker = CloneWorker<FsCloneProbe, GitCloneExecutor>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/cg)
    pub state_dir: PathBuf,
    /// Where mirrors are cloned to
    pub repos_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the clone job log
    pub jobs_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        let repos_dir = crate::env::repos_dir(&state_dir);
        Ok(Self::with_dirs(state_dir, repos_dir))
    }

    /// Lay out every path under `state_dir`, with mirrors under `repos_dir`.
    pub fn with_dirs(state_dir: impl Into<PathBuf>, repos_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            repos_dir: repos_dir.into(),
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            jobs_path: state_dir.join("jobs").join("jobs.jsonl"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as its own task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Durable clone queue (shared with the scheduler and workers)
    pub store: Arc<JobStore>,
    pub controller: Arc<DaemonController>,
    pub workers: Vec<DaemonWorker>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state plus its bound socket.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Remove the socket and PID file. Queued and interrupted jobs stay in
    /// the job log and resume on the next start.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        remove_if_exists(&self.config.socket_path, "socket file");
        remove_if_exists(&self.config.lock_path, "PID file");

        info!(
            queued = self.store.queued_count(),
            running = self.store.running_count(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

fn remove_if_exists(path: &Path, what: &str) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", what, e);
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
