// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clone execution: fetch a repository into its clone directory.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cg_core::{CloneDir, CloneOptions, RepoName};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default upper bound for a single clone
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Name prefix of the sibling directory a clone is fetched into
const TEMP_PREFIX: &str = ".clone-tmp-";

/// Errors from running a clone
#[derive(Debug, Error)]
pub enum CloneError {
    #[error("failed to spawn git: {0}")]
    Spawn(#[source] io::Error),
    #[error("git clone timed out after {0:?}")]
    Timeout(Duration),
    #[error("git clone exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Receives human-readable progress lines while a clone runs
pub trait CloneProgressSink: Send + Sync {
    fn update(&self, text: &str);
}

/// Performs the actual clone of a repository
#[async_trait]
pub trait CloneExecutor: Clone + Send + Sync + 'static {
    async fn clone_repo(
        &self,
        repo: &RepoName,
        dir: &CloneDir,
        opts: CloneOptions,
        progress: &dyn CloneProgressSink,
    ) -> Result<(), CloneError>;
}

/// Clones with `git clone --mirror` from `<remote_base>/<repo>`.
///
/// The clone lands in a temporary sibling directory and is renamed into place
/// once git succeeds.
#[derive(Clone, Debug)]
pub struct GitCloneExecutor {
    remote_base: String,
    program: PathBuf,
    timeout: Duration,
}

impl GitCloneExecutor {
    pub fn new(remote_base: impl Into<String>) -> Self {
        Self {
            remote_base: remote_base.into(),
            program: PathBuf::from("git"),
            timeout: DEFAULT_CLONE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `program` instead of the `git` found on `PATH`
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn remote_url(&self, repo: &RepoName) -> String {
        format!("{}/{}", self.remote_base.trim_end_matches('/'), repo)
    }
}

#[async_trait]
impl CloneExecutor for GitCloneExecutor {
    async fn clone_repo(
        &self,
        repo: &RepoName,
        dir: &CloneDir,
        opts: CloneOptions,
        progress: &dyn CloneProgressSink,
    ) -> Result<(), CloneError> {
        let url = self.remote_url(repo);
        let parent = dir.repo_root();
        tokio::fs::create_dir_all(parent).await?;
        // Only one clone per repository runs at a time, so any temp dir here
        // was abandoned by an earlier run.
        sweep_temp_dirs(parent).await;
        let tmp = TempCloneDir::new(parent.join(format!("{TEMP_PREFIX}{}", nanoid::nanoid!(8))));

        info!(%repo, %url, "starting git clone");
        let mut cmd = Command::new(&self.program);
        cmd.args(["clone", "--mirror", "--progress", &url])
            .arg(tmp.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Declared after `tmp` so a dropped clone kills git before the guard
        // removes its directory.
        let mut child = cmd.spawn().map_err(CloneError::Spawn)?;
        let stderr = child.stderr.take();

        let run = async {
            let tail = match stderr {
                Some(stderr) => pump_progress(stderr, progress).await,
                None => String::new(),
            };
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, tail))
        };
        let outcome = tokio::time::timeout(self.timeout, run).await;

        let (status, tail) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(%repo, error = %e, "failed to kill timed out git clone");
                }
                return Err(CloneError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            return Err(CloneError::Failed {
                status: status.to_string(),
                stderr: tail,
            });
        }

        // Anything already at the destination is either a stale partial clone
        // or the clone an overwrite asked to replace.
        if tokio::fs::try_exists(dir.path()).await? {
            if !opts.overwrite {
                warn!(%repo, dir = %dir, "replacing incomplete clone directory");
            }
            tokio::fs::remove_dir_all(dir.path()).await?;
        }
        tokio::fs::rename(tmp.path(), dir.path()).await?;
        tmp.persist();
        info!(%repo, dir = %dir, "git clone finished");
        Ok(())
    }
}

/// Temporary clone target, removed on drop unless persisted
struct TempCloneDir {
    path: PathBuf,
    persisted: bool,
}

impl TempCloneDir {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The directory has been renamed into place; nothing is left to remove
    fn persist(mut self) {
        self.persisted = true;
    }
}

impl Drop for TempCloneDir {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove temporary clone dir"
                );
            }
        }
    }
}

/// Remove temp dirs left under `parent` by clones that never finished.
async fn sweep_temp_dirs(parent: &Path) {
    let mut entries = match tokio::fs::read_dir(parent).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %parent.display(), error = %e, "cannot scan for stale clone dirs");
            return;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
            continue;
        }
        let path = entry.path();
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => info!(path = %path.display(), "removed stale clone dir"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale clone dir"),
        }
    }
}

/// Forward git's `\r`/`\n` separated progress lines; returns the last line seen.
async fn pump_progress<R: AsyncRead + Unpin>(
    mut reader: R,
    sink: &dyn CloneProgressSink,
) -> String {
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    let mut last = String::new();
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "stopped reading git progress");
                break;
            }
        };
        for &byte in &buf[..n] {
            if byte == b'\r' || byte == b'\n' {
                emit_line(&mut pending, &mut last, sink);
            } else {
                pending.push(byte);
            }
        }
    }
    emit_line(&mut pending, &mut last, sink);
    last
}

fn emit_line(pending: &mut Vec<u8>, last: &mut String, sink: &dyn CloneProgressSink) {
    let line = String::from_utf8_lossy(pending).trim().to_string();
    pending.clear();
    if !line.is_empty() {
        sink.update(&line);
        *last = line;
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CloneError, CloneExecutor, CloneProgressSink};
    use async_trait::async_trait;
    use cg_core::{CloneDir, CloneOptions, RepoName};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Recorded clone call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CloneCall {
        pub repo: RepoName,
        pub dir: CloneDir,
        pub overwrite: bool,
    }

    #[derive(Default)]
    struct FakeCloneState {
        calls: Vec<CloneCall>,
        progress: Vec<String>,
        failure: Option<String>,
        gate: Option<Arc<Notify>>,
    }

    /// Fake executor: reports scripted progress, then writes `HEAD` on success
    #[derive(Clone, Default)]
    pub struct FakeCloneExecutor {
        inner: Arc<Mutex<FakeCloneState>>,
    }

    impl FakeCloneExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_progress(self, lines: &[&str]) -> Self {
            self.inner.lock().progress = lines.iter().map(|s| s.to_string()).collect();
            self
        }

        pub fn fail_with(&self, message: impl Into<String>) {
            self.inner.lock().failure = Some(message.into());
        }

        /// Hold each clone after its progress lines until the returned
        /// `Notify` is signalled.
        pub fn gate(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.inner.lock().gate = Some(Arc::clone(&gate));
            gate
        }

        pub fn calls(&self) -> Vec<CloneCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl CloneExecutor for FakeCloneExecutor {
        async fn clone_repo(
            &self,
            repo: &RepoName,
            dir: &CloneDir,
            opts: CloneOptions,
            progress: &dyn CloneProgressSink,
        ) -> Result<(), CloneError> {
            let (lines, failure, gate) = {
                let mut inner = self.inner.lock();
                inner.calls.push(CloneCall {
                    repo: repo.clone(),
                    dir: dir.clone(),
                    overwrite: opts.overwrite,
                });
                (inner.progress.clone(), inner.failure.clone(), inner.gate.clone())
            };
            for line in &lines {
                progress.update(line);
            }
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if let Some(stderr) = failure {
                return Err(CloneError::Failed {
                    status: "exit status: 128".into(),
                    stderr,
                });
            }
            tokio::fs::create_dir_all(dir.path()).await?;
            tokio::fs::write(dir.head_path(), "ref: refs/heads/main\n").await?;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{CloneCall, FakeCloneExecutor};

#[cfg(test)]
#[path = "clone_tests.rs"]
mod tests;
