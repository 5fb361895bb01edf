// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Packed policy records carried by load requests.
//!
//! Each record is a fixed head followed by the regex bytes, with no
//! padding or terminator; records are packed back to back.
//!
//! ```text
//! symbol_count: u32 | len: u32 | regex[len]
//! ```

use crate::error::WireError;
use crate::record::MAX_PAYLOAD;

/// Encoded size of a policy record head.
pub const POLICY_HEAD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Number of distinct symbols the sender believes the regex uses.
    /// Advisory: the receiver compiles the regex and counts for itself.
    pub symbol_count: u32,
    pub regex: Vec<u8>,
}

impl PolicyRecord {
    /// Builds a record, counting distinct alphanumeric symbols in `regex`.
    pub fn new(regex: impl Into<Vec<u8>>) -> Self {
        let regex = regex.into();

        let mut seen = [false; 256];
        for &byte in regex.iter().filter(|b| b.is_ascii_alphanumeric()) {
            seen[byte as usize] = true;
        }

        Self {
            symbol_count: seen.iter().filter(|&&s| s).count() as u32,
            regex,
        }
    }

    pub fn encoded_len(&self) -> usize {
        POLICY_HEAD_LEN + self.regex.len()
    }
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let word: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(word))
}

/// Packs `policies` contiguously. Fails if the result exceeds
/// [`MAX_PAYLOAD`].
pub fn pack_policies(policies: &[PolicyRecord]) -> Result<Vec<u8>, WireError> {
    let len: usize = policies.iter().map(PolicyRecord::encoded_len).sum();
    if len > MAX_PAYLOAD {
        return Err(WireError::PayloadTooLarge {
            len,
            limit: MAX_PAYLOAD,
        });
    }

    let mut out = Vec::with_capacity(len);
    for policy in policies {
        out.extend_from_slice(&policy.symbol_count.to_le_bytes());
        out.extend_from_slice(&(policy.regex.len() as u32).to_le_bytes());
        out.extend_from_slice(&policy.regex);
    }

    Ok(out)
}

/// Walks exactly `count` records out of `payload`, which must hold
/// nothing else.
pub fn unpack_policies(payload: &[u8], count: usize) -> Result<Vec<PolicyRecord>, WireError> {
    let mut policies = Vec::with_capacity(count.min(payload.len() / POLICY_HEAD_LEN));
    let mut at = 0;

    for index in 0..count {
        if at == payload.len() {
            return Err(WireError::PolicyCountMismatch {
                declared: count,
                found: index,
            });
        }

        let (Some(symbol_count), Some(len)) = (read_u32(payload, at), read_u32(payload, at + 4))
        else {
            return Err(WireError::PolicyTruncated { index });
        };

        let start = at + POLICY_HEAD_LEN;
        let regex = start
            .checked_add(len as usize)
            .and_then(|end| payload.get(start..end))
            .ok_or(WireError::PolicyTruncated { index })?;

        policies.push(PolicyRecord {
            symbol_count,
            regex: regex.to_vec(),
        });
        at = start + regex.len();
    }

    if at != payload.len() {
        return Err(WireError::LengthMismatch {
            declared: at,
            actual: payload.len(),
        });
    }

    Ok(policies)
}
