// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde_json::Value;

use cg_wire::RepoLookup;

use crate::client::DaemonStatus;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `obj` as JSON, or run `text` for human output.
pub fn format_or_json(
    format: OutputFormat,
    obj: &Value,
    text: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text(),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(obj)?),
    }
    Ok(())
}

/// Format seconds as a compact duration ("45s", "3m", "2h", "4d")
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

/// One-line description of a lookup result
pub fn format_lookup(repo: &str, lookup: &RepoLookup) -> String {
    match (lookup.not_found, lookup.clone_in_progress) {
        (false, _) => format!("{repo}: available"),
        (true, true) if lookup.clone_progress.is_empty() => format!("{repo}: cloning"),
        (true, true) => format!("{repo}: cloning ({})", lookup.clone_progress),
        (true, false) => format!("{repo}: not found"),
    }
}

pub fn format_status(status: &DaemonStatus) -> String {
    let mut out = format!(
        "uptime {}, {} queued, {} running\n",
        format_elapsed(status.uptime_secs),
        status.queued_jobs,
        status.running_jobs
    );
    if status.clones.is_empty() {
        out.push_str("no clones in progress\n");
        return out;
    }
    for clone in &status.clones {
        let progress = if clone.progress.is_empty() { "starting" } else { &clone.progress };
        out.push_str(&format!(
            "  {}  {}  {}\n",
            clone.dir.display(),
            format_elapsed(clone.elapsed_secs),
            progress
        ));
    }
    out
}
