// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::RepoLookup;

/// Response from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Answer to a repository lookup
    Repo { lookup: RepoLookup },

    /// Daemon status
    Status {
        uptime_secs: u64,
        #[serde(default)]
        clones: Vec<CloneEntry>,
        #[serde(default)]
        queued_jobs: usize,
        #[serde(default)]
        running_jobs: usize,
    },

    /// Daemon is shutting down
    ShuttingDown,

    /// Error response
    Error { message: String },
}

/// A clone currently in flight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloneEntry {
    pub dir: PathBuf,
    pub progress: String,
    pub elapsed_secs: u64,
}
