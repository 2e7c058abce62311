// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use cg_wire::{Request, Response};
use tempfile::TempDir;
use tokio::net::UnixListener;
use yare::parameterized;

use super::*;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

fn lookup(not_found: bool, clone_in_progress: bool, progress: &str) -> RepoLookup {
    RepoLookup {
        not_found,
        clone_in_progress,
        clone_progress: progress.to_string(),
    }
}

/// Daemon that answers successive repo lookups with `replies`, repeating the
/// last one once they run out.
fn scripted_daemon(replies: Vec<RepoLookup>) -> (TempDir, DaemonClient) {
    let dir = tempfile::tempdir().unwrap();
    let socket: PathBuf = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    tokio::spawn(async move {
        let mut served = 0;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (mut reader, mut writer) = stream.into_split();
            let request = cg_wire::read_request(&mut reader, IO_TIMEOUT).await;
            let Ok(Request::RepoLookup { .. }) = request else {
                return;
            };
            let reply = replies[served.min(replies.len() - 1)].clone();
            served += 1;
            let response = Response::Repo { lookup: reply };
            let _ = cg_wire::write_response(&mut writer, &response, IO_TIMEOUT).await;
        }
    });
    let client = DaemonClient::connect(&socket).unwrap();
    (dir, client)
}

fn wait_args(timeout: u64) -> RepoArgs {
    RepoArgs {
        name: "acme/widgets".to_string(),
        wait: true,
        poll_ms: 5,
        timeout,
    }
}

fn exit_code_of(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.downcast_ref::<ExitError>().map(|exit| exit.code).unwrap_or(-1),
    }
}

#[parameterized(
    found = { false, false, 0 },
    cloning = { true, true, EXIT_CLONING },
    missing = { true, false, EXIT_NOT_FOUND },
)]
fn exit_code_reflects_lookup(not_found: bool, clone_in_progress: bool, expected: i32) {
    assert_eq!(exit_code(&lookup(not_found, clone_in_progress, "")), expected);
}

#[parameterized(
    first_poll = { None, true, "", false },
    still_queued = { Some(""), true, "", false },
    progressing = { Some("Receiving objects: 10%"), true, "Receiving objects: 20%", false },
    requeued = { Some("Receiving objects: 10%"), true, "", true },
    finished = { Some("Receiving objects: 10%"), false, "", false },
)]
fn clone_restart_detection(previous: Option<&str>, in_progress: bool, now: &str, expected: bool) {
    assert_eq!(clone_restarted(previous, &lookup(true, in_progress, now)), expected);
}

#[tokio::test]
async fn wait_returns_once_clone_lands() {
    let (_dir, client) = scripted_daemon(vec![
        lookup(true, true, ""),
        lookup(true, true, "Receiving objects: 40%"),
        lookup(false, false, ""),
    ]);

    let result = repo(&client, wait_args(600), OutputFormat::Json).await;

    assert_eq!(exit_code_of(result), 0);
}

#[tokio::test]
async fn wait_stops_when_failed_clone_is_rescheduled() {
    let (_dir, client) = scripted_daemon(vec![
        lookup(true, true, ""),
        lookup(true, true, "fatal: repository not found"),
        lookup(true, true, ""),
    ]);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        repo(&client, wait_args(600), OutputFormat::Json),
    )
    .await
    .unwrap();

    assert_eq!(exit_code_of(result), EXIT_NOT_FOUND);
}

#[tokio::test]
async fn wait_gives_up_at_deadline() {
    let (_dir, client) = scripted_daemon(vec![lookup(true, true, "")]);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        repo(&client, wait_args(0), OutputFormat::Json),
    )
    .await
    .unwrap();

    assert_eq!(exit_code_of(result), EXIT_CLONING);
}
