// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Byte-message transports.
//!
//! A transport moves whole encoded records; framing is the transport's
//! job, record parsing is not.

mod channel;
#[cfg(target_os = "linux")]
mod sysv;

pub use channel::ChannelTransport;
#[cfg(target_os = "linux")]
pub use sysv::{SysvDuplex, SysvQueue};

use zeroize::Zeroizing;

use crate::error::TransportError;

pub trait Transport {
    /// Blocks until one message arrives.
    fn recv(&self) -> Result<Zeroizing<Vec<u8>>, TransportError>;

    /// Sends one message of at most [`MAX_RECORD_LEN`](crate::MAX_RECORD_LEN) bytes.
    fn send(&self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn recv(&self) -> Result<Zeroizing<Vec<u8>>, TransportError> {
        (**self).recv()
    }

    fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }
}
