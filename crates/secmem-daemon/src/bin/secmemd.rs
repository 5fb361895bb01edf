// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! secmemd - policy-gated secure memory daemon.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use secmem_daemon::{DaemonArgs, DaemonConfig, Dispatcher, Server, signal};
use secmem_guard::{HardeningOptions, harden};

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v.
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("Failed to initialize tracing subscriber")
}

#[cfg(target_os = "linux")]
fn serve(config: &DaemonConfig) -> Result<()> {
    use secmem_wire::SysvDuplex;

    let transport = SysvDuplex::server(config.request_key, config.reply_key)
        .context("Failed to open message queues")?;

    let stale = transport.inbound().drain()?;
    if stale > 0 {
        warn!(stale, "dropped stale requests");
    }

    info!(
        request_key = format_args!("{:#x}", config.request_key),
        reply_key = format_args!("{:#x}", config.reply_key),
        max_pid = config.limits.max_pid,
        max_arena = config.limits.max_arena,
        "serving"
    );

    let server = Server::new(transport, Dispatcher::new(config.limits));
    let (reason, stats) = server.run(signal::stop_flag());

    let processes = server.dispatcher().registry().len()?;
    info!(?reason, received = stats.received, processes, "shutting down");

    // Dropping the registry zeroizes every remaining arena.
    drop(server);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn serve(_config: &DaemonConfig) -> Result<()> {
    anyhow::bail!("System V message queues are only supported on Linux")
}

fn main() -> Result<()> {
    let args = DaemonArgs::parse();
    setup_logging(args.verbose)?;

    let config = DaemonConfig::try_from(args)?;

    if config.harden {
        let status = harden(HardeningOptions {
            lock_all_memory: config.lock_all,
        });
        if status.is_protected() {
            info!(?status, "process hardened");
        } else {
            warn!(?status, "process hardening failed");
        }
    }

    signal::install().context("Failed to install signal handlers")?;

    serve(&config)
}
