// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! clonegate CLI (cg)

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::client::{default_socket_path, DaemonClient};
use crate::commands::{daemon, repo, status};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "cg", version, about = "Look up repositories served by the clonegate daemon")]
struct Cli {
    /// Daemon socket (defaults to `<state dir>/daemon.sock`)
    #[arg(long, env = "CG_SOCKET", global = true)]
    socket: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a repository, scheduling a clone if it is missing
    Repo(repo::RepoArgs),
    /// Show in-flight clones and queue depth
    Status,
    /// Check that the daemon is answering
    Ping,
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                ExitCode::from(u8::try_from(exit.code).unwrap_or(1))
            }
            None => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let socket = match cli.socket {
        Some(socket) => socket,
        None => default_socket_path()
            .ok_or_else(|| anyhow!("could not determine state directory"))?,
    };

    match cli.command {
        Commands::Daemon(args) => daemon::daemon(&socket, args, cli.output).await,
        Commands::Repo(args) => {
            repo::repo(&DaemonClient::connect(&socket)?, args, cli.output).await
        }
        Commands::Status => status::status(&DaemonClient::connect(&socket)?, cli.output).await,
        Commands::Ping => status::ping(&DaemonClient::connect(&socket)?, cli.output).await,
    }
}
