// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Ask for a repository, cloning it on demand if needed
    RepoLookup { repo: String },

    /// Daemon status including in-flight clones
    Status,

    /// Stop the daemon
    Shutdown,
}
