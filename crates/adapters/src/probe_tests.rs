// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cg_core::test_support::repo;
use tempfile::tempdir;

#[tokio::test]
async fn missing_directory_is_not_cloned() {
    let root = tempdir().unwrap();
    let dir = CloneDir::for_repo(root.path(), &repo("acme/widgets"));

    assert!(!FsCloneProbe.is_cloned(&dir).await.unwrap());
}

#[tokio::test]
async fn directory_without_head_is_not_cloned() {
    let root = tempdir().unwrap();
    let dir = CloneDir::for_repo(root.path(), &repo("acme/widgets"));
    std::fs::create_dir_all(dir.path()).unwrap();

    assert!(!FsCloneProbe.is_cloned(&dir).await.unwrap());
}

#[tokio::test]
async fn head_file_means_cloned() {
    let root = tempdir().unwrap();
    let dir = CloneDir::for_repo(root.path(), &repo("acme/widgets"));
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(dir.head_path(), "ref: refs/heads/main\n").unwrap();

    assert!(FsCloneProbe.is_cloned(&dir).await.unwrap());
}

#[tokio::test]
async fn head_directory_is_not_a_clone() {
    let root = tempdir().unwrap();
    let dir = CloneDir::for_repo(root.path(), &repo("acme/widgets"));
    std::fs::create_dir_all(dir.head_path()).unwrap();

    assert!(!FsCloneProbe.is_cloned(&dir).await.unwrap());
}

#[tokio::test]
async fn file_in_place_of_parent_is_not_cloned() {
    let root = tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("acme")).unwrap();
    std::fs::write(root.path().join("acme/widgets"), "not a dir").unwrap();
    let dir = CloneDir::for_repo(root.path(), &repo("acme/widgets"));

    assert!(!FsCloneProbe.is_cloned(&dir).await.unwrap());
}

#[tokio::test]
async fn fake_probe_reports_configured_state() {
    let probe = FakeCloneProbe::new();
    let dir = CloneDir::for_repo(std::path::Path::new("/repos"), &repo("acme/widgets"));

    assert!(!probe.is_cloned(&dir).await.unwrap());
    probe.set_cloned(&dir, true);
    assert!(probe.is_cloned(&dir).await.unwrap());
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn fake_probe_failure_is_distinct_from_not_cloned() {
    let probe = FakeCloneProbe::new();
    probe.fail_with("permission denied");
    let dir = CloneDir::for_repo(std::path::Path::new("/repos"), &repo("acme/widgets"));

    let err = probe.is_cloned(&dir).await.unwrap_err();
    assert!(err.to_string().contains("permission denied"), "got: {err}");
}
