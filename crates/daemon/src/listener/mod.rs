// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each one in its own task so a slow probe never blocks other clients.

use std::sync::Arc;
use std::time::Instant;

use cg_adapters::{CloneProbe, JobScheduler};
use cg_core::{AdmissionDecision, RejectReason, RepoName};
use cg_engine::{AdmissionController, AutoClonePolicy};
use cg_storage::JobStore;
use cg_wire::{self as protocol, CloneEntry, RepoLookup, Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::env::ipc_timeout;

/// Shared daemon context for all request handlers.
pub struct ListenCtx<P, S, T> {
    pub controller: Arc<AdmissionController<P, S, T>>,
    pub store: Arc<JobStore>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<P, S, T> {
    unix: UnixListener,
    ctx: Arc<ListenCtx<P, S, T>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<P, S, T> Listener<P, S, T>
where
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<P, S, T>>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// The request handler is raced against client disconnect detection. If the
/// client goes away first, the token passed to admission is cancelled and
/// nothing is written back.
pub async fn handle_connection<R, W, P, S, T>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx<P, S, T>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    let request = protocol::read_request(&mut reader, ipc_timeout()).await?;

    // Status and ping are polled; keep them out of the info log
    if matches!(request, Request::Ping | Request::Status) {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    let token = CancellationToken::new();
    let response = tokio::select! {
        response = handle_request(request, ctx, &token) => response,
        _ = detect_client_disconnect(&mut reader) => {
            token.cancel();
            debug!("Client disconnected, cancelling handler");
            return Ok(());
        }
    };

    let Some(response) = response else {
        return Ok(());
    };
    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Resolves once the client closes its end (or sends stray bytes).
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request. `None` means there is nobody left to answer.
async fn handle_request<P, S, T>(
    request: Request,
    ctx: &ListenCtx<P, S, T>,
    cancel: &CancellationToken,
) -> Option<Response>
where
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    match request {
        Request::Ping => Some(Response::Pong),

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Some(Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            })
        }

        Request::RepoLookup { repo } => handle_repo_lookup(ctx, &repo, cancel).await,

        Request::Status => Some(handle_status(ctx).await),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Some(Response::ShuttingDown)
        }
    }
}

async fn handle_repo_lookup<P, S, T>(
    ctx: &ListenCtx<P, S, T>,
    raw: &str,
    cancel: &CancellationToken,
) -> Option<Response>
where
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    let repo = match RepoName::parse(raw) {
        Ok(repo) => repo,
        Err(e) => {
            return Some(Response::Error {
                message: e.to_string(),
            })
        }
    };

    let decision = ctx.controller.admit(&repo, cancel).await;
    debug!(%repo, ?decision, "admission decided");

    match decision {
        AdmissionDecision::Rejected {
            reason: RejectReason::Cancelled,
        } => None,
        // Never report an unreadable clone as missing
        AdmissionDecision::Rejected {
            reason: reason @ RejectReason::ProbeFailed { .. },
        } => Some(Response::Error {
            message: format!("{repo}: {reason}"),
        }),
        decision => Some(Response::Repo {
            lookup: RepoLookup::from(&decision),
        }),
    }
}

async fn handle_status<P, S, T>(ctx: &ListenCtx<P, S, T>) -> Response
where
    P: CloneProbe,
    S: JobScheduler,
    T: AutoClonePolicy,
{
    let clones = ctx
        .controller
        .locker()
        .in_progress()
        .into_iter()
        .map(|clone| CloneEntry {
            dir: clone.dir.path().to_path_buf(),
            progress: clone.progress,
            elapsed_secs: clone.elapsed.as_secs(),
        })
        .collect();

    // The store lock is held across fsync by writers
    let store = Arc::clone(&ctx.store);
    let depth = tokio::task::spawn_blocking(move || store.depth()).await;
    let (queued_jobs, running_jobs) = match depth {
        Ok(depth) => depth,
        Err(e) => {
            error!(error = %e, "job store depth task failed");
            return Response::Error {
                message: format!("status unavailable: {e}"),
            };
        }
    };

    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        clones,
        queued_jobs,
        running_jobs,
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
