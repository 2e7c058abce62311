// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serial_test::serial;
use tempfile::tempdir;

use super::*;

#[test]
fn config_lays_out_paths_under_state_dir() {
    let config = Config::with_dirs("/state", "/mirrors");

    assert_eq!(config.socket_path, Path::new("/state/daemon.sock"));
    assert_eq!(config.lock_path, Path::new("/state/daemon.pid"));
    assert_eq!(config.log_path, Path::new("/state/daemon.log"));
    assert_eq!(config.jobs_path, Path::new("/state/jobs/jobs.jsonl"));
    assert_eq!(config.repos_dir, Path::new("/mirrors"));
}

#[test]
#[serial]
fn config_load_reads_state_and_repos_dirs() {
    std::env::set_var("CG_STATE_DIR", "/tmp/cg-load");
    std::env::remove_var("CG_REPOS_DIR");
    let config = Config::load();
    std::env::remove_var("CG_STATE_DIR");

    let config = config.unwrap();
    assert_eq!(config.state_dir, Path::new("/tmp/cg-load"));
    assert_eq!(config.repos_dir, Path::new("/tmp/cg-load/repos"));
}

#[tokio::test]
#[serial]
async fn shutdown_removes_socket_and_pid() {
    let dir = tempdir().unwrap();
    let config = Config::with_dirs(dir.path().join("state"), dir.path().join("repos"));
    let StartupResult {
        mut daemon,
        listener,
    } = startup(&config).await.unwrap();
    drop(listener);

    daemon.shutdown().unwrap();

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}
