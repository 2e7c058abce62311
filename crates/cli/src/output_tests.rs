// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cg_wire::CloneEntry;
use yare::parameterized;

use super::*;

#[parameterized(
    seconds = { 45, "45s" },
    minutes = { 125, "2m" },
    hours = { 7200, "2h" },
    days = { 3 * 86_400 + 5, "3d" },
)]
fn elapsed_is_compact(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

fn lookup(not_found: bool, clone_in_progress: bool, progress: &str) -> RepoLookup {
    RepoLookup {
        not_found,
        clone_in_progress,
        clone_progress: progress.to_string(),
    }
}

#[parameterized(
    available = { lookup(false, false, ""), "a/b: available" },
    cloning_no_progress = { lookup(true, true, ""), "a/b: cloning" },
    cloning_with_progress = {
        lookup(true, true, "Receiving objects: 9%"),
        "a/b: cloning (Receiving objects: 9%)"
    },
    missing = { lookup(true, false, ""), "a/b: not found" },
)]
fn lookup_lines(lookup: RepoLookup, expected: &str) {
    assert_eq!(format_lookup("a/b", &lookup), expected);
}

#[test]
fn status_lists_clones() {
    let status = DaemonStatus {
        uptime_secs: 3700,
        clones: vec![CloneEntry {
            dir: "/repos/a/b/.git".into(),
            progress: String::new(),
            elapsed_secs: 12,
        }],
        queued_jobs: 4,
        running_jobs: 1,
    };

    let text = format_status(&status);

    assert!(text.starts_with("uptime 1h, 4 queued, 1 running\n"), "{text}");
    assert!(text.contains("/repos/a/b/.git  12s  starting"), "{text}");
}

#[test]
fn idle_status_says_so() {
    let status = DaemonStatus {
        uptime_secs: 5,
        clones: vec![],
        queued_jobs: 0,
        running_jobs: 0,
    };
    assert!(format_status(&status).contains("no clones in progress"));
}
