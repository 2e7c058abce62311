// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use cg_adapters::{FsCloneProbe, GitCloneExecutor, StoreScheduler};
use cg_engine::{AdmissionController, CloneWorker, RepositoryLocker};
use cg_storage::JobStore;
use fs2::FileExt;
use tokio::net::UnixListener;
use tracing::info;

use crate::env::{self, EnvAutoClone};

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so a running daemon's PID survives a failed attempt.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Create directories
    std::fs::create_dir_all(&config.repos_dir)?;
    if let Some(parent) = config.jobs_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 4. Replay the job log; interrupted clones are requeued
    let store = Arc::new(JobStore::open(&config.jobs_path)?);
    info!(
        queued = store.queued_count(),
        path = %config.jobs_path.display(),
        "Recovered clone queue"
    );

    // 5. Wire the admission controller and workers around one registry
    let locker = RepositoryLocker::new();
    let controller = AdmissionController::new(
        &config.repos_dir,
        FsCloneProbe,
        StoreScheduler::new(Arc::clone(&store)),
        EnvAutoClone,
        locker.clone(),
    )
    .with_probe_failure_policy(env::probe_failure_policy());

    let executor = GitCloneExecutor::new(env::remote_base()).with_timeout(env::clone_timeout());
    let worker = CloneWorker::new(
        Arc::clone(&store),
        locker,
        FsCloneProbe,
        executor,
        &config.repos_dir,
    )
    .with_poll_interval(env::worker_poll_interval());
    let workers = vec![worker; env::clone_concurrency()];

    // 6. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        repos_dir = %config.repos_dir.display(),
        workers = workers.len(),
        "Daemon started"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            store,
            controller: Arc::new(controller),
            workers,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
