// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg repo` - look up a repository, cloning it on demand

use std::time::{Duration, Instant};

use anyhow::Result;
use cg_wire::RepoLookup;
use clap::Args;

use crate::client::DaemonClient;
use crate::exit_error::{ExitError, EXIT_CLONING, EXIT_NOT_FOUND};
use crate::output::{format_lookup, format_or_json, OutputFormat};

#[derive(Args)]
pub struct RepoArgs {
    /// Repository name, e.g. `acme/widgets`
    pub name: String,

    /// Keep polling while a clone is in progress
    #[arg(long)]
    pub wait: bool,

    /// Poll interval for --wait, in milliseconds
    #[arg(long, default_value = "1000", requires = "wait")]
    pub poll_ms: u64,

    /// Give up waiting after this many seconds
    #[arg(long, default_value = "600", requires = "wait")]
    pub timeout: u64,
}

pub async fn repo(client: &DaemonClient, args: RepoArgs, format: OutputFormat) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(args.timeout);
    let mut last_progress: Option<String> = None;

    loop {
        let lookup = client.repo_lookup(&args.name).await?;
        if !args.wait || !lookup.clone_in_progress || Instant::now() >= deadline {
            return report(&args.name, &lookup, format);
        }
        if clone_restarted(last_progress.as_deref(), &lookup) {
            return Err(ExitError::new(
                EXIT_NOT_FOUND,
                format!("clone of {} ended without producing the repository", args.name),
            )
            .into());
        }

        if format == OutputFormat::Text
            && last_progress.as_deref() != Some(lookup.clone_progress.as_str())
        {
            println!("{}", format_lookup(&args.name, &lookup));
        }
        last_progress = Some(lookup.clone_progress);
        tokio::time::sleep(Duration::from_millis(args.poll_ms)).await;
    }
}

/// A clone that had reported progress is back to a queued, progress-less
/// state: that attempt ended and another was scheduled in its place.
pub fn clone_restarted(previous: Option<&str>, lookup: &RepoLookup) -> bool {
    lookup.clone_in_progress
        && lookup.clone_progress.is_empty()
        && previous.is_some_and(|p| !p.is_empty())
}

fn report(name: &str, lookup: &RepoLookup, format: OutputFormat) -> Result<()> {
    let obj = serde_json::json!({ "repo": name, "lookup": lookup });
    format_or_json(format, &obj, || println!("{}", format_lookup(name, lookup)))?;
    match exit_code(lookup) {
        0 => Ok(()),
        code => Err(ExitError::silent(code).into()),
    }
}

/// 0 when available, otherwise whether someone is fetching it
pub fn exit_code(lookup: &RepoLookup) -> i32 {
    match (lookup.not_found, lookup.clone_in_progress) {
        (false, _) => 0,
        (true, true) => EXIT_CLONING,
        (true, false) => EXIT_NOT_FOUND,
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
