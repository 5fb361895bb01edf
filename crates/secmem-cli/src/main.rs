// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! secmem - command-line client for secmemd.

#[cfg(test)]
mod tests;

mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use secmem_daemon::{parse_key, parse_number};

/// Talk to a running secmemd.
#[derive(Debug, Parser)]
#[command(name = "secmem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Daemon request queue key (hex)
    #[arg(long, global = true, value_parser = parse_key, default_value = "0xdead1")]
    in_key: i32,

    /// Daemon reply queue key (hex)
    #[arg(long, global = true, value_parser = parse_key, default_value = "0xdead2")]
    out_key: i32,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Register a process with an arena and its policies
    Load {
        #[arg(long)]
        pid: u32,

        /// Arena size in bytes
        #[arg(long, value_parser = parse_number)]
        size: u32,

        /// Policy regex; repeat for more (ids follow order)
        #[arg(long = "policy", required = true)]
        policies: Vec<String>,
    },

    /// Tear down a process
    Unload {
        #[arg(long)]
        pid: u32,
    },

    /// Allocate a segment bound to a policy
    Alloc {
        #[arg(long)]
        pid: u32,

        #[arg(long, value_parser = parse_number)]
        size: u32,

        #[arg(long, default_value = "0")]
        policy_id: u32,
    },

    /// Release the segment starting at an address
    Dealloc {
        #[arg(long)]
        pid: u32,

        #[arg(long, value_parser = parse_number)]
        addr: u32,
    },

    /// Read bytes from a segment
    Read {
        #[arg(long)]
        pid: u32,

        #[arg(long, value_parser = parse_number)]
        addr: u32,

        #[arg(long, value_parser = parse_number)]
        len: u32,
    },

    /// Write hex-encoded bytes to a segment
    Write {
        #[arg(long)]
        pid: u32,

        #[arg(long, value_parser = parse_number)]
        addr: u32,

        /// Data as hex, e.g. 0a0b0c0d
        #[arg(long, value_parser = commands::parse_hex)]
        data: commands::HexBytes,
    },

    /// Show a process's arena, policies, and segments
    View {
        #[arg(long)]
        pid: u32,
    },

    /// Probe the daemon
    Nil,

    /// Stop the daemon
    Terminate,

    /// Discard stale messages left in both queues
    Drain {
        /// Remove the queues afterwards
        #[arg(long)]
        remove: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("Failed to initialize tracing subscriber")
}

#[cfg(target_os = "linux")]
fn run(cli: Cli) -> Result<ExitCode> {
    use secmem_wire::{Client, SysvDuplex};

    let transport =
        SysvDuplex::client(cli.in_key, cli.out_key).context("Failed to open message queues")?;

    if let Command::Drain { remove } = cli.command {
        return commands::drain(transport, remove);
    }

    let acked = commands::run(&Client::new(transport), cli.command, &mut std::io::stdout())?;
    Ok(if acked {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(not(target_os = "linux"))]
fn run(_cli: Cli) -> Result<ExitCode> {
    anyhow::bail!("System V message queues are only supported on Linux")
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    run(cli)
}
