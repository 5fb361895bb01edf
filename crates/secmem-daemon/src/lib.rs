// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The secmem daemon.
//!
//! [`Dispatcher`] turns boundary records into registry operations and
//! replies; [`Server`] runs it over a [`Transport`](secmem_wire::Transport)
//! until a terminate request, a signal, or a hang-up.
//!
//! # Example
//!
//! ```rust
//! use secmem_daemon::{DispatchLimits, Dispatcher, Outcome};
//! use secmem_wire::{PolicyRecord, Reply, Request};
//!
//! let dispatcher = Dispatcher::new(DispatchLimits::default());
//! let load = Request::Load {
//!     pid: 7,
//!     arena_size: 0x100,
//!     policies: vec![PolicyRecord::new("(R|W)*")],
//! };
//!
//! let bytes = load.to_record().unwrap().encode().unwrap();
//! let Outcome::Reply(record) = dispatcher.handle(&bytes) else {
//!     panic!("load is always answered");
//! };
//! assert!(Reply::from_record(record).unwrap().is_ack());
//! ```

#[cfg(test)]
mod tests;

mod config;
mod dispatch;
mod server;
pub mod signal;

pub use config::{
    ConfigError, DEFAULT_MAX_ARENA, DEFAULT_MAX_PID, DEFAULT_REPLY_KEY, DEFAULT_REQUEST_KEY,
    DaemonArgs, DaemonConfig, DispatchLimits, parse_key, parse_number,
};
pub use dispatch::{DispatchError, Dispatcher, Outcome};
pub use server::{ServeStats, Server, StopReason};
