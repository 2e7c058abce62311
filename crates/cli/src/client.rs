// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request per connection over the Unix socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cg_wire::{self as protocol, CloneEntry, ProtocolError, RepoLookup, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors talking to the daemon
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {})", .0.display())]
    DaemonNotRunning(PathBuf),

    #[error("failed to connect to {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Daemon(String),

    #[error("unexpected response from daemon: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        match self {
            Self::DaemonNotRunning(_) => true,
            Self::Connect { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Snapshot returned by the `Status` request
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub clones: Vec<CloneEntry>,
    pub queued_jobs: usize,
    pub running_jobs: usize,
}

/// Resolve the daemon socket: CG_STATE_DIR > XDG_STATE_HOME/cg > ~/.local/state/cg
pub fn default_socket_path() -> Option<PathBuf> {
    let state_dir = match std::env::var("CG_STATE_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => match std::env::var("XDG_STATE_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join("cg"),
            Err(_) => dirs::home_dir()?.join(".local/state/cg"),
        },
    };
    Some(state_dir.join("daemon.sock"))
}

pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    /// Fails fast when the socket file does not exist.
    pub fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning(socket_path.to_path_buf()));
        }
        Ok(Self {
            socket_path: socket_path.to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Send one request and wait for its response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|source| {
            ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            }
        })?;
        let (mut reader, mut writer) = stream.into_split();
        protocol::write_request(&mut writer, request, self.timeout).await?;
        let response = protocol::read_response(&mut reader, self.timeout).await?;
        match response {
            Response::Error { message } => Err(ClientError::Daemon(message)),
            other => Ok(other),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(Self::reject(other)),
        }
    }

    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(Self::reject(other)),
        }
    }

    pub async fn repo_lookup(&self, repo: &str) -> Result<RepoLookup, ClientError> {
        let request = Request::RepoLookup {
            repo: repo.to_string(),
        };
        match self.send(&request).await? {
            Response::Repo { lookup } => Ok(lookup),
            other => Err(Self::reject(other)),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                clones,
                queued_jobs,
                running_jobs,
            } => Ok(DaemonStatus {
                uptime_secs,
                clones,
                queued_jobs,
                running_jobs,
            }),
            other => Err(Self::reject(other)),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(Self::reject(other)),
        }
    }

    fn reject(other: Response) -> ClientError {
        ClientError::UnexpectedResponse(format!("{other:?}"))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
