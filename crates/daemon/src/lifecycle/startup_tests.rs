// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use cg_core::{CloneJobStatus, CloneOptions, SchedulingRequest};
use fs2::FileExt;
use serial_test::serial;
use tempfile::tempdir;

use super::*;

fn test_config(dir: &Path) -> Config {
    Config::with_dirs(dir.join("state"), dir.join("repos"))
}

#[tokio::test]
#[serial]
async fn startup_creates_layout_and_writes_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();

    assert!(config.socket_path.exists(), "socket should be bound");
    assert!(config.repos_dir.is_dir(), "repos dir should exist");
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(!result.daemon.workers.is_empty());
    assert_eq!(result.daemon.controller.repos_root(), config.repos_dir.as_path());
}

#[tokio::test]
#[serial]
async fn startup_lock_failed_does_not_remove_existing_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();

    // Files a running daemon would have
    std::fs::write(&config.socket_path, b"").unwrap();
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(config.socket_path.exists(), "socket file must not be deleted on LockFailed");
    assert_eq!(std::fs::read_to_string(&config.lock_path).unwrap(), "12345");
}

#[tokio::test]
#[serial]
async fn startup_replaces_stale_socket() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.socket_path, b"stale").unwrap();

    let _result = startup(&config).await.unwrap();

    let meta = std::fs::symlink_metadata(&config.socket_path).unwrap();
    assert!(!meta.is_file(), "stale regular file should be replaced by a socket");
}

#[tokio::test]
#[serial]
async fn startup_requeues_jobs_interrupted_by_a_crash() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(config.jobs_path.parent().unwrap()).unwrap();
    {
        let store = JobStore::open(&config.jobs_path).unwrap();
        let repo = cg_core::test_support::repo("acme/widgets");
        store.create(SchedulingRequest::new(repo, CloneOptions::default())).unwrap();
        store.take_next().unwrap().unwrap();
        assert_eq!(store.running_count(), 1);
    }

    let result = startup(&config).await.unwrap();

    let jobs = result.daemon.store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, CloneJobStatus::Queued);
}

#[tokio::test]
#[serial]
async fn bind_failure_cleans_up_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    // A directory where the socket should go cannot be removed with remove_file
    std::fs::create_dir_all(config.socket_path.join("blocker")).unwrap();

    assert!(startup(&config).await.is_err());
    assert!(!config.lock_path.exists(), "PID file should be removed after a failed start");
}
