// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clone state probing: is a repository already fully cloned on disk?

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use cg_core::CloneDir;
use thiserror::Error;

/// Errors from probing clone state.
///
/// A missing directory is not an error; it means "not cloned".
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to probe {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Answers whether a clone directory holds a complete clone
#[async_trait]
pub trait CloneProbe: Clone + Send + Sync + 'static {
    async fn is_cloned(&self, dir: &CloneDir) -> Result<bool, ProbeError>;
}

/// Filesystem probe: a clone is complete once `<dir>/HEAD` is a regular file.
///
/// Clones are written to a temporary directory and renamed into place, so a
/// visible `HEAD` never belongs to a half-written clone.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCloneProbe;

#[async_trait]
impl CloneProbe for FsCloneProbe {
    async fn is_cloned(&self, dir: &CloneDir) -> Result<bool, ProbeError> {
        let head = dir.head_path();
        match tokio::fs::metadata(&head).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e)
                if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) =>
            {
                Ok(false)
            }
            Err(source) => Err(ProbeError::Io { path: head, source }),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CloneProbe, ProbeError};
    use async_trait::async_trait;
    use cg_core::CloneDir;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeProbeState {
        cloned: HashSet<CloneDir>,
        failure: Option<String>,
        hang: bool,
        calls: usize,
    }

    /// Fake clone probe for testing
    #[derive(Clone, Default)]
    pub struct FakeCloneProbe {
        inner: Arc<Mutex<FakeProbeState>>,
    }

    impl FakeCloneProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_cloned(&self, dir: &CloneDir, cloned: bool) {
            let mut inner = self.inner.lock();
            if cloned {
                inner.cloned.insert(dir.clone());
            } else {
                inner.cloned.remove(dir);
            }
        }

        /// Make every probe fail with a permission error
        pub fn fail_with(&self, message: impl Into<String>) {
            self.inner.lock().failure = Some(message.into());
        }

        /// Make every probe wait forever (for cancellation tests)
        pub fn hang(&self) {
            self.inner.lock().hang = true;
        }

        pub fn calls(&self) -> usize {
            self.inner.lock().calls
        }
    }

    #[async_trait]
    impl CloneProbe for FakeCloneProbe {
        async fn is_cloned(&self, dir: &CloneDir) -> Result<bool, ProbeError> {
            let (hang, result) = {
                let mut inner = self.inner.lock();
                inner.calls += 1;
                let result = match &inner.failure {
                    Some(message) => Err(ProbeError::Io {
                        path: dir.head_path(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::PermissionDenied,
                            message.clone(),
                        ),
                    }),
                    None => Ok(inner.cloned.contains(dir)),
                };
                (inner.hang, result)
            };
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCloneProbe;

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
