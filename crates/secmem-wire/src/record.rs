// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fixed-layout boundary records.
//!
//! ```text
//! offset  size  field
//!      0     4  tag        (operation | ACK/NAK modifier)
//!      4     4  pid
//!      8     4  field2     (size or address)
//!     12     4  field3     (policy count, policy id, or length)
//!     16     4  data_len
//!     20     n  payload    (n = data_len <= MAX_PAYLOAD)
//! ```
//!
//! All integers are little-endian.
//!
//! A read request is the exception: its `data_len` is the number of bytes
//! asked for, and the body is either absent or `data_len` filler bytes
//! that are discarded.

use zeroize::Zeroizing;

use crate::error::WireError;
use crate::tag::{NAK, OpTag, Tag, strip_modifiers};

/// Encoded header size in bytes.
pub const HEADER_LEN: usize = 20;
/// Largest payload a record may carry.
pub const MAX_PAYLOAD: usize = 4096;
/// Largest encoded record.
pub const MAX_RECORD_LEN: usize = HEADER_LEN + MAX_PAYLOAD;

/// A raw boundary record. The tag is kept undecoded so unknown operations
/// can still be answered.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Record {
    /// Operation tag, possibly carrying an ACK/NAK modifier.
    pub tag: u32,
    /// Client process the record concerns.
    pub pid: u32,
    /// Size or address, depending on the operation.
    pub field2: u32,
    /// Policy count, policy id, or unused.
    pub field3: u32,
    /// Bytes asked for by a read request; sent as `data_len` with no body.
    pub requested_len: u32,
    /// Body bytes; wiped on drop.
    pub payload: Zeroizing<Vec<u8>>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl Reader<'_> {
    fn u32(&mut self) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[self.cursor..self.cursor + 4]);
        self.cursor += 4;
        u32::from_le_bytes(word)
    }
}

impl Record {
    /// A record with an empty payload.
    pub fn new(tag: u32, pid: u32, field2: u32, field3: u32) -> Self {
        Self {
            tag,
            pid,
            field2,
            field3,
            requested_len: 0,
            payload: Zeroizing::new(Vec::new()),
        }
    }

    /// Sets the length a read request asks for.
    pub fn with_requested_len(mut self, len: u32) -> Self {
        self.requested_len = len;
        self
    }

    /// Replaces the payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Zeroizing::new(payload.into());
        self
    }

    /// Value of the header's `data_len` word: the body length, or the
    /// requested length of a body-less read request.
    pub fn data_len(&self) -> usize {
        if self.payload.is_empty() {
            self.requested_len as usize
        } else {
            self.payload.len()
        }
    }

    fn is_read_request(&self) -> bool {
        self.tag == OpTag::Read.as_u32()
    }

    /// Decodes the tag.
    pub fn tag(&self) -> Result<Tag, WireError> {
        Tag::from_u32(self.tag)
    }

    /// A failed reply echoing this record's header, with no payload.
    pub fn nak(&self) -> Self {
        Self::new(
            strip_modifiers(self.tag) | NAK,
            self.pid,
            self.field2,
            self.field3,
        )
    }

    /// Serializes header and payload. Fails if the payload exceeds
    /// [`MAX_PAYLOAD`].
    pub fn encode(&self) -> Result<Zeroizing<Vec<u8>>, WireError> {
        let body_len = self.payload.len();
        if body_len > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: body_len,
                limit: MAX_PAYLOAD,
            });
        }

        let data_len = self.data_len() as u32;
        let mut out = Zeroizing::new(Vec::with_capacity(HEADER_LEN + body_len));
        for word in [self.tag, self.pid, self.field2, self.field3, data_len] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.payload);

        Ok(out)
    }

    /// Parses the header alone, leaving the payload empty. Used to answer
    /// records whose body is malformed.
    pub fn decode_header(bytes: &[u8]) -> Result<Self, WireError> {
        Self::split_header(bytes).map(|(record, _)| record)
    }

    fn split_header(bytes: &[u8]) -> Result<(Self, usize), WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::Truncated {
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }

        let mut reader = Reader { bytes, cursor: 0 };
        let record = Self::new(reader.u32(), reader.u32(), reader.u32(), reader.u32());
        let data_len = reader.u32() as usize;

        Ok((record, data_len))
    }

    /// Parses one record occupying exactly `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (record, data_len) = Self::split_header(bytes)?;

        if record.is_read_request() {
            return Self::decode_read(record, data_len, &bytes[HEADER_LEN..]);
        }

        if data_len > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: data_len,
                limit: MAX_PAYLOAD,
            });
        }

        let body = &bytes[HEADER_LEN..];
        if body.len() < data_len {
            return Err(WireError::Truncated {
                needed: HEADER_LEN + data_len,
                available: bytes.len(),
            });
        }
        if body.len() > data_len {
            return Err(WireError::LengthMismatch {
                declared: data_len,
                actual: body.len(),
            });
        }

        Ok(record.with_payload(body))
    }

    fn decode_read(record: Self, data_len: usize, body: &[u8]) -> Result<Self, WireError> {
        if !body.is_empty() && body.len() != data_len {
            return Err(WireError::LengthMismatch {
                declared: data_len,
                actual: body.len(),
            });
        }

        Ok(record.with_requested_len(data_len as u32))
    }
}

impl core::fmt::Debug for Record {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Record")
            .field("tag", &format_args!("{:#x}", self.tag))
            .field("pid", &self.pid)
            .field("field2", &format_args!("{:#x}", self.field2))
            .field("field3", &self.field3)
            .field("data_len", &self.data_len())
            .finish()
    }
}
