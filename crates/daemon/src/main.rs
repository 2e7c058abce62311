// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! clonegate daemon (cgd)
//!
//! Answers repository lookups over a Unix socket and clones missing
//! repositories in the background.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use cg_daemon::{startup, Config, LifecycleError, ListenCtx, Listener, StartupResult};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// How long workers get to notice cancellation before the daemon exits anyway
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cgd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cgd: failed to open log at {}: {e}", config.log_path.display());
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("daemon failed: {}", e);
            eprintln!("cgd: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to `<state>/daemon.log` through a non-blocking writer; `RUST_LOG` overrides the level.
fn init_logging(config: &Config) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file_name = config.log_path.file_name().unwrap_or_else(|| "daemon.log".as_ref());
    let appender = tracing_appender::rolling::never(&config.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    let StartupResult {
        mut daemon,
        listener,
    } = startup(&config).await?;

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        controller: Arc::clone(&daemon.controller),
        store: Arc::clone(&daemon.store),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown),
    });
    let listener_task = tokio::spawn(Listener::new(listener, ctx).run());

    let cancel = CancellationToken::new();
    let workers: Vec<_> = std::mem::take(&mut daemon.workers)
        .into_iter()
        .map(|worker| tokio::spawn(worker.run(cancel.child_token())))
        .collect();

    println!("READY");
    info!(socket = %config.socket_path.display(), "listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = shutdown.notified() => info!("shutdown requested"),
    }

    listener_task.abort();
    cancel.cancel();
    for worker in workers {
        if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
            warn!("clone worker did not stop within {:?}", DRAIN_TIMEOUT);
        }
    }

    daemon.shutdown()
}
