// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Command-line configuration for `secmemd`.

use clap::Parser;
use thiserror::Error;

/// Default request queue key.
pub const DEFAULT_REQUEST_KEY: i32 = 0xdead1;
/// Default reply queue key.
pub const DEFAULT_REPLY_KEY: i32 = 0xdead2;
/// Default highest accepted pid.
pub const DEFAULT_MAX_PID: u32 = 32768;
/// Default largest accepted arena.
pub const DEFAULT_MAX_ARENA: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("request and reply queues must differ (both {0:#x})")]
    SameQueueKeys(i32),

    #[error("max pid must be non-zero")]
    ZeroMaxPid,

    #[error("max arena must be non-zero")]
    ZeroMaxArena,
}

/// Parses `0x`-prefixed hex or plain decimal.
pub fn parse_number(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|error| format!("invalid number '{text}': {error}"))
}

/// Parses a SysV IPC key given in hex, with or without `0x`.
pub fn parse_key(text: &str) -> Result<i32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16)
        // Keys are bit patterns; the sign is irrelevant.
        .map(|key| key as i32)
        .map_err(|error| format!("invalid queue key '{text}': {error}"))
}

/// Policy-gated secure memory daemon.
#[derive(Debug, Parser)]
#[command(name = "secmemd")]
#[command(author, version, about, long_about = None)]
pub struct DaemonArgs {
    /// Request queue key (hex)
    #[arg(long, value_parser = parse_key, default_value = "0xdead1")]
    pub in_key: i32,

    /// Reply queue key (hex)
    #[arg(long, value_parser = parse_key, default_value = "0xdead2")]
    pub out_key: i32,

    /// Highest client pid accepted
    #[arg(long, value_parser = parse_number, default_value = "32768")]
    pub max_pid: u32,

    /// Largest arena accepted on load, in bytes
    #[arg(long, value_parser = parse_number, default_value = "0x1000000")]
    pub max_arena: u32,

    /// mlock every arena (best-effort)
    #[arg(long)]
    pub lock_memory: bool,

    /// Lock all daemon memory with mlockall at startup
    #[arg(long)]
    pub lock_all: bool,

    /// Skip process hardening
    #[arg(long)]
    pub no_harden: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Bounds the dispatcher enforces before touching the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_pid: u32,
    pub max_arena: u32,
    pub lock_memory: bool,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_pid: DEFAULT_MAX_PID,
            max_arena: DEFAULT_MAX_ARENA,
            lock_memory: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub request_key: i32,
    pub reply_key: i32,
    pub limits: DispatchLimits,
    pub harden: bool,
    pub lock_all: bool,
    pub verbose: u8,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            request_key: DEFAULT_REQUEST_KEY,
            reply_key: DEFAULT_REPLY_KEY,
            limits: DispatchLimits::default(),
            harden: true,
            lock_all: false,
            verbose: 0,
        }
    }
}

impl TryFrom<DaemonArgs> for DaemonConfig {
    type Error = ConfigError;

    fn try_from(args: DaemonArgs) -> Result<Self, Self::Error> {
        if args.in_key == args.out_key {
            return Err(ConfigError::SameQueueKeys(args.in_key));
        }
        if args.max_pid == 0 {
            return Err(ConfigError::ZeroMaxPid);
        }
        if args.max_arena == 0 {
            return Err(ConfigError::ZeroMaxArena);
        }

        Ok(Self {
            request_key: args.in_key,
            reply_key: args.out_key,
            limits: DispatchLimits {
                max_pid: args.max_pid,
                max_arena: args.max_arena,
                lock_memory: args.lock_memory,
            },
            harden: !args.no_harden,
            lock_all: args.lock_all,
            verbose: args.verbose,
        })
    }
}
