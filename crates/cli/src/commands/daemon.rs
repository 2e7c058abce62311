// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg daemon` - Daemon management commands

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

/// How long `stop` waits for the socket to disappear
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Stop the daemon
    Stop,
    /// Print the daemon's protocol version
    Version,
}

pub async fn daemon(socket: &Path, args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Stop => stop(socket, format).await,
        DaemonCommand::Version => version(socket, format).await,
    }
}

async fn stop(socket: &Path, format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect(socket) {
        Ok(client) => client,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(e.into()),
    };
    match client.shutdown().await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(e.into()),
    }

    let started = Instant::now();
    while socket.exists() {
        if started.elapsed() > STOP_TIMEOUT {
            return Err(anyhow!("daemon did not exit within {}s", STOP_TIMEOUT.as_secs()));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    format_or_json(format, &serde_json::json!({ "stopped": true }), || {
        println!("Daemon stopped")
    })
}

async fn version(socket: &Path, format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect(socket) {
        Ok(client) => client,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(e.into()),
    };
    let version = client.hello().await?;
    format_or_json(format, &serde_json::json!({ "version": version }), || {
        println!("cgd {}", version)
    })
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    format_or_json(format, &serde_json::json!({ "running": false }), || {
        println!("Daemon not running")
    })
}
