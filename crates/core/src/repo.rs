// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository names and the on-disk directory key derived from them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Errors from validating a repository name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoNameError {
    #[error("repository name is empty")]
    Empty,
    #[error("repository name {0:?} contains an empty path segment")]
    EmptySegment(String),
    #[error("repository name {name:?} contains reserved segment {segment:?}")]
    ReservedSegment { name: String, segment: String },
    #[error("repository name {0:?} contains a NUL or backslash")]
    InvalidChar(String),
}

/// Name of a repository, e.g. `github.com/acme/widgets`.
///
/// Equality is exact string equality. Names built through [`RepoName::parse`]
/// map to distinct clone directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoName(SmolStr);

impl RepoName {
    /// Validate and wrap a repository name.
    pub fn parse(name: impl AsRef<str>) -> Result<Self, RepoNameError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(RepoNameError::Empty);
        }
        if name.contains(['\0', '\\']) {
            return Err(RepoNameError::InvalidChar(name.to_string()));
        }
        for segment in name.split('/') {
            match segment {
                "" => return Err(RepoNameError::EmptySegment(name.to_string())),
                "." | ".." | ".git" => {
                    return Err(RepoNameError::ReservedSegment {
                        name: name.to_string(),
                        segment: segment.to_string(),
                    })
                }
                _ => {}
            }
        }
        Ok(Self(SmolStr::new(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RepoName {
    type Error = RepoNameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Git directory of a repository clone: `<repos_root>/<repo>/.git`.
///
/// This is the dedup key for in-flight clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloneDir(PathBuf);

impl CloneDir {
    pub fn for_repo(repos_root: &Path, repo: &RepoName) -> Self {
        let mut path = repos_root.to_path_buf();
        path.extend(repo.as_str().split('/'));
        path.push(".git");
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The `HEAD` file whose presence marks a finished clone
    pub fn head_path(&self) -> PathBuf {
        self.0.join("HEAD")
    }

    /// Working directory that contains the `.git` directory
    pub fn repo_root(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }
}

impl fmt::Display for CloneDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for CloneDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
