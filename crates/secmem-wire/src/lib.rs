// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Boundary records for the secmem daemon and the transports that carry
//! them.
//!
//! A [`Record`] is a fixed 20-byte little-endian header plus up to
//! [`MAX_PAYLOAD`] bytes. [`Request`] and [`Reply`] give it typed shape;
//! [`Transport`] moves encoded records between processes.
//!
//! # Example
//!
//! ```rust
//! use secmem_wire::{PolicyRecord, Record, Request, WireError};
//!
//! fn example() -> Result<(), WireError> {
//!     let request = Request::Load {
//!         pid: 7,
//!         arena_size: 0x100,
//!         policies: vec![PolicyRecord::new("(R|W)*"), PolicyRecord::new("RW")],
//!     };
//!
//!     let bytes = request.to_record()?.encode()?;
//!     let decoded = Request::from_record(&Record::decode(&bytes)?)?;
//!
//!     assert_eq!(decoded, request);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#[cfg(test)]
mod tests;

mod client;
mod error;
mod humanize;
mod message;
mod policy;
mod record;
mod tag;
mod transport;

pub use client::Client;
pub use error::{ExchangeError, TransportError, WireError};
pub use humanize::hex_dump;
pub use message::{Reply, Request};
pub use policy::{POLICY_HEAD_LEN, PolicyRecord, pack_policies, unpack_policies};
pub use record::{HEADER_LEN, MAX_PAYLOAD, MAX_RECORD_LEN, Record};
pub use tag::{ACK, NAK, OpTag, Status, Tag, strip_modifiers};
pub use transport::{ChannelTransport, Transport};
#[cfg(target_os = "linux")]
pub use transport::{SysvDuplex, SysvQueue};
