// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::RepoName;

/// Parse a repository name known to be valid.
#[allow(clippy::panic)]
pub fn repo(name: &str) -> RepoName {
    match RepoName::parse(name) {
        Ok(repo) => repo,
        Err(e) => panic!("invalid test repo name {name:?}: {e}"),
    }
}

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::RepoName;
    use proptest::prelude::*;

    /// One to three `[a-z0-9_-]` segments joined by `/`.
    pub fn arb_repo_name() -> impl Strategy<Value = RepoName> {
        prop::collection::vec("[a-z0-9_-]{1,8}", 1..=3).prop_filter_map(
            "valid repo name",
            |segments| RepoName::parse(segments.join("/")).ok(),
        )
    }
}
