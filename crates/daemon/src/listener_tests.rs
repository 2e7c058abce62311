// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use cg_adapters::{FakeCloneProbe, FakeScheduler, StoreScheduler};
use cg_core::test_support::repo;
use cg_core::CloneJobStatus;
use cg_engine::{AutoCloneSwitch, RepositoryLocker};
use tempfile::TempDir;

use super::*;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness<S> {
    _dir: TempDir,
    probe: FakeCloneProbe,
    toggle: AutoCloneSwitch,
    locker: RepositoryLocker,
    ctx: ListenCtx<FakeCloneProbe, S, AutoCloneSwitch>,
}

fn harness_with<S: JobScheduler>(make_scheduler: impl FnOnce(Arc<JobStore>) -> S) -> Harness<S> {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JobStore::open(&dir.path().join("jobs.jsonl")).unwrap());
    let probe = FakeCloneProbe::new();
    let toggle = AutoCloneSwitch::enabled();
    let locker = RepositoryLocker::new();
    let controller = AdmissionController::new(
        dir.path().join("repos"),
        probe.clone(),
        make_scheduler(Arc::clone(&store)),
        toggle.clone(),
        locker.clone(),
    );
    Harness {
        _dir: dir,
        probe,
        toggle,
        locker,
        ctx: ListenCtx {
            controller: Arc::new(controller),
            store,
            start_time: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        },
    }
}

fn harness() -> Harness<StoreScheduler> {
    harness_with(StoreScheduler::new)
}

async fn roundtrip<S: JobScheduler>(h: &Harness<S>, request: Request) -> Response {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let serve = handle_connection(server_read, server_write, &h.ctx);
    let ask = async {
        protocol::write_request(&mut client_write, &request, TIMEOUT).await.unwrap();
        protocol::read_response(&mut client_read, TIMEOUT).await.unwrap()
    };
    let (served, response) = tokio::join!(serve, ask);
    served.unwrap();
    response
}

fn lookup(name: &str) -> Request {
    Request::RepoLookup {
        repo: name.to_string(),
    }
}

#[tokio::test]
async fn ping_returns_pong() {
    let h = harness();
    assert_eq!(roundtrip(&h, Request::Ping).await, Response::Pong);
}

#[tokio::test]
async fn hello_returns_daemon_version() {
    let h = harness();
    let hello = Request::Hello {
        version: "0.0.1".to_string(),
    };
    let response = roundtrip(&h, hello).await;
    assert_eq!(
        response,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn cloned_repo_is_found() {
    let h = harness();
    let widgets = repo("acme/widgets");
    h.probe.set_cloned(&h.ctx.controller.clone_dir(&widgets), true);

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    assert_eq!(
        response,
        Response::Repo {
            lookup: RepoLookup::found()
        }
    );
    assert!(h.ctx.store.jobs().is_empty());
}

#[tokio::test]
async fn missing_repo_is_scheduled_and_reported_in_progress() {
    let h = harness();

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    let Response::Repo { lookup } = response else {
        panic!("expected Repo, got {response:?}");
    };
    assert!(lookup.not_found);
    assert!(lookup.clone_in_progress);
    assert_eq!(lookup.clone_progress, "");

    let jobs = h.ctx.store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].repo, repo("acme/widgets"));
    assert_eq!(jobs[0].status, CloneJobStatus::Queued);
    assert!(h.locker.is_empty(), "admission never registers clones itself");
}

#[tokio::test]
async fn repeated_lookups_share_one_job() {
    let h = harness();

    roundtrip(&h, lookup("acme/widgets")).await;
    roundtrip(&h, lookup("acme/widgets")).await;

    assert_eq!(h.ctx.store.queued_count(), 1);
}

#[tokio::test]
async fn in_flight_clone_reports_progress() {
    let h = harness();
    let dir = h.ctx.controller.clone_dir(&repo("acme/widgets"));
    let _lock = h.locker.try_lock(&dir).unwrap();
    h.locker.update_progress(&dir, "Receiving objects: 42%");

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    assert_eq!(
        response,
        Response::Repo {
            lookup: RepoLookup {
                not_found: true,
                clone_in_progress: true,
                clone_progress: "Receiving objects: 42%".to_string(),
            }
        }
    );
    assert!(h.ctx.store.jobs().is_empty());
}

#[tokio::test]
async fn disabled_auto_clone_reports_not_found() {
    let h = harness();
    h.toggle.set_disabled(true);

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    assert_eq!(
        response,
        Response::Repo {
            lookup: RepoLookup {
                not_found: true,
                clone_in_progress: false,
                clone_progress: String::new()
            }
        }
    );
    assert!(h.ctx.store.jobs().is_empty());
}

#[tokio::test]
async fn scheduling_failure_reports_not_found_without_progress() {
    let scheduler = FakeScheduler::new();
    scheduler.fail_with("store offline");
    let h = harness_with(|_| scheduler.clone());

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    let Response::Repo { lookup } = response else {
        panic!("expected Repo, got {response:?}");
    };
    assert!(lookup.not_found);
    assert!(!lookup.clone_in_progress);
    assert_eq!(scheduler.calls().len(), 1);
}

#[tokio::test]
async fn probe_failure_is_an_error_response() {
    let h = harness();
    h.probe.fail_with("permission denied");

    let response = roundtrip(&h, lookup("acme/widgets")).await;

    let Response::Error { message } = response else {
        panic!("expected Error, got {response:?}");
    };
    assert!(message.contains("acme/widgets"), "{message}");
    assert!(message.contains("probe failed"), "{message}");
    assert!(h.ctx.store.jobs().is_empty());
}

#[tokio::test]
async fn invalid_repo_name_is_rejected_before_admission() {
    let h = harness();

    let response = roundtrip(&h, lookup("../etc")).await;

    assert!(matches!(response, Response::Error { .. }), "got {response:?}");
    assert_eq!(h.probe.calls(), 0);
}

#[tokio::test]
async fn status_lists_in_flight_clones_and_queue() {
    let h = harness();
    roundtrip(&h, lookup("acme/queued")).await;
    let dir = h.ctx.controller.clone_dir(&repo("acme/widgets"));
    let _lock = h.locker.try_lock(&dir).unwrap();
    h.locker.update_progress(&dir, "Resolving deltas: 10%");

    let response = roundtrip(&h, Request::Status).await;

    let Response::Status {
        clones,
        queued_jobs,
        running_jobs,
        ..
    } = response
    else {
        panic!("expected Status, got {response:?}");
    };
    assert_eq!(queued_jobs, 1);
    assert_eq!(running_jobs, 0);
    assert_eq!(clones.len(), 1);
    assert_eq!(clones[0].dir, dir.path());
    assert_eq!(clones[0].progress, "Resolving deltas: 10%");
}

#[tokio::test]
async fn shutdown_request_notifies_daemon() {
    let h = harness();
    let notified = h.ctx.shutdown.notified();

    let response = roundtrip(&h, Request::Shutdown).await;

    assert_eq!(response, Response::ShuttingDown);
    tokio::time::timeout(TIMEOUT, notified).await.unwrap();
}

#[tokio::test]
async fn client_disconnect_cancels_pending_admission() {
    let scheduler = FakeScheduler::new();
    scheduler.hang();
    let h = harness_with(|_| scheduler.clone());

    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (client_read, mut client_write) = tokio::io::split(client);
    protocol::write_request(&mut client_write, &lookup("acme/widgets"), TIMEOUT).await.unwrap();

    let serve = handle_connection(server_read, server_write, &h.ctx);
    let hang_up = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(client_write);
        drop(client_read);
    };
    let (served, ()) = tokio::time::timeout(TIMEOUT, async { tokio::join!(serve, hang_up) })
        .await
        .expect("handler should stop once the client is gone");

    served.unwrap();
    assert_eq!(scheduler.calls().len(), 1);
    assert!(h.locker.is_empty());
}
