// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cg_adapters::clone::DEFAULT_CLONE_TIMEOUT;
use cg_engine::{AutoClonePolicy, ProbeFailurePolicy, DEFAULT_POLL_INTERVAL};
use tracing::warn;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: CG_STATE_DIR > XDG_STATE_HOME/cg > ~/.local/state/cg
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cg"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/cg"))
}

/// Root under which mirrors live (default `<state>/repos`)
pub fn repos_dir(state_dir: &Path) -> PathBuf {
    match std::env::var("CG_REPOS_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => state_dir.join("repos"),
    }
}

/// Operator kill switch for on-demand cloning
pub fn auto_clone_disabled() -> bool {
    std::env::var("CG_DISABLE_AUTO_CLONE").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// How admission treats an unreadable clone directory. Unknown values fall
/// back to the default with a warning.
pub fn probe_failure_policy() -> ProbeFailurePolicy {
    match std::env::var("CG_PROBE_FAILURE") {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("ignoring CG_PROBE_FAILURE: {}", e);
            ProbeFailurePolicy::default()
        }),
        Err(_) => ProbeFailurePolicy::default(),
    }
}

/// Base URL that repository names are appended to when cloning
pub fn remote_base() -> String {
    std::env::var("CG_REMOTE_BASE")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://github.com".to_string())
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    duration_ms("CG_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// How long an idle worker sleeps before polling the job store again
pub fn worker_poll_interval() -> Duration {
    duration_ms("CG_WORKER_POLL_MS").unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Upper bound on a single `git clone`
pub fn clone_timeout() -> Duration {
    duration_ms("CG_CLONE_TIMEOUT_MS").unwrap_or(DEFAULT_CLONE_TIMEOUT)
}

/// Number of clone workers (at least one)
pub fn clone_concurrency() -> usize {
    std::env::var("CG_CLONE_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(2)
        .max(1)
}

/// Auto-clone policy backed by `CG_DISABLE_AUTO_CLONE`, re-read on every
/// decision so operators can flip it without a restart.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAutoClone;

impl AutoClonePolicy for EnvAutoClone {
    fn auto_clone_disabled(&self) -> bool {
        auto_clone_disabled()
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
