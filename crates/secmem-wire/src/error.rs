// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for secmem-wire.

use thiserror::Error;

/// Errors from encoding or decoding records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("record truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("payload of {len} bytes exceeds capacity of {limit}")]
    PayloadTooLarge { len: usize, limit: usize },

    #[error("declared data length {declared} disagrees with {actual} payload bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown operation tag {0:#x}")]
    UnknownTag(u32),

    #[error("tag {0:#x} is a reply, expected a request")]
    UnexpectedReply(u32),

    #[error("tag {0:#x} is a request, expected a reply")]
    UnexpectedRequest(u32),

    #[error("policy record {index} is truncated")]
    PolicyTruncated { index: usize },

    #[error("expected {declared} policy records, payload holds {found}")]
    PolicyCountMismatch { declared: usize, found: usize },

    #[error("{op} request carries no payload, got {len} bytes")]
    UnexpectedPayload { op: &'static str, len: usize },

    #[error("{field} value {value} does not fit the wire format")]
    FieldOverflow { field: &'static str, value: usize },
}

/// Errors from moving records between processes.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A blocking call was interrupted by a signal.
    #[error("interrupted")]
    Interrupted,

    /// The peer hung up.
    #[error("transport disconnected")]
    Disconnected,

    #[error("message of {len} bytes exceeds the maximum record size {limit}")]
    Oversized { len: usize, limit: usize },
}

impl TransportError {
    #[cfg(unix)]
    pub(crate) fn last_os(op: &'static str) -> Self {
        let source = std::io::Error::last_os_error();
        if source.kind() == std::io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::Os { op, source }
        }
    }
}

/// Errors from a request/reply exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
