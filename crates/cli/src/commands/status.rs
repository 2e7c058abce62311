// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg status` and `cg ping`

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_status, OutputFormat};

pub async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;
    let obj = serde_json::json!({
        "uptime_secs": status.uptime_secs,
        "queued_jobs": status.queued_jobs,
        "running_jobs": status.running_jobs,
        "clones": status.clones.iter().map(|c| serde_json::json!({
            "dir": c.dir,
            "progress": c.progress,
            "elapsed_secs": c.elapsed_secs,
        })).collect::<Vec<_>>(),
    });
    format_or_json(format, &obj, || print!("{}", format_status(&status)))
}

pub async fn ping(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    client.ping().await?;
    format_or_json(format, &serde_json::json!({ "pong": true }), || println!("pong"))
}
