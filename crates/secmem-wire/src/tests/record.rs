// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::error::WireError;
use crate::record::{HEADER_LEN, MAX_PAYLOAD, Record};
use crate::tag::NAK;

// =============================================================================
// encode()
// =============================================================================

#[test]
fn test_encode_layout_is_little_endian() {
    let record = Record::new(0x06, 7, 0x10, 0).with_payload(b"ab".to_vec());

    let bytes = record.encode().expect("Failed to encode()");

    assert_eq!(
        bytes.as_slice(),
        &[
            0x06, 0, 0, 0, // tag
            7, 0, 0, 0, // pid
            0x10, 0, 0, 0, // field2
            0, 0, 0, 0, // field3
            2, 0, 0, 0, // data_len
            b'a', b'b',
        ]
    );
}

#[test]
fn test_encode_payload_limit() {
    let full = Record::new(0x06, 1, 0, 0).with_payload(vec![0xAA; MAX_PAYLOAD]);
    let over = Record::new(0x06, 1, 0, 0).with_payload(vec![0xAA; MAX_PAYLOAD + 1]);

    assert_eq!(
        full.encode().map(|bytes| bytes.len()),
        Ok(HEADER_LEN + MAX_PAYLOAD)
    );
    assert_eq!(
        over.encode().map(|bytes| bytes.len()),
        Err(WireError::PayloadTooLarge {
            len: MAX_PAYLOAD + 1,
            limit: MAX_PAYLOAD,
        })
    );
}

// =============================================================================
// decode()
// =============================================================================

#[test]
fn test_decode_inverts_encode() {
    let record = Record::new(0x15, 42, 0x40, 3).with_payload(vec![1, 2, 3]);

    let bytes = record.encode().expect("Failed to encode()");
    let decoded = Record::decode(&bytes).expect("Failed to decode(..)");

    assert_eq!(decoded, record);
}

#[test]
fn test_decode_short_header() {
    assert_eq!(
        Record::decode(&[0u8; 12]),
        Err(WireError::Truncated {
            needed: HEADER_LEN,
            available: 12,
        })
    );
}

#[test]
fn test_decode_missing_payload_bytes() {
    let mut bytes = Record::new(0x06, 1, 0, 0)
        .with_payload(vec![9; 8])
        .encode()
        .expect("Failed to encode()")
        .to_vec();
    bytes.truncate(HEADER_LEN + 5);

    assert_eq!(
        Record::decode(&bytes),
        Err(WireError::Truncated {
            needed: HEADER_LEN + 8,
            available: HEADER_LEN + 5,
        })
    );
}

#[test]
fn test_decode_trailing_bytes() {
    let mut bytes = Record::new(0x07, 1, 0, 0)
        .encode()
        .expect("Failed to encode()")
        .to_vec();
    bytes.extend_from_slice(&[0, 0]);

    assert_eq!(
        Record::decode(&bytes),
        Err(WireError::LengthMismatch {
            declared: 0,
            actual: 2,
        })
    );
}

#[test]
fn test_decode_declared_length_over_limit() {
    let mut bytes = vec![0u8; HEADER_LEN];
    bytes[16..20].copy_from_slice(&((MAX_PAYLOAD as u32) + 1).to_le_bytes());

    assert_eq!(
        Record::decode(&bytes),
        Err(WireError::PayloadTooLarge {
            len: MAX_PAYLOAD + 1,
            limit: MAX_PAYLOAD,
        })
    );
}

#[test]
fn test_decode_keeps_unknown_tag() {
    let bytes = Record::new(0x0B, 3, 0, 0)
        .encode()
        .expect("Failed to encode()");

    let record = Record::decode(&bytes).expect("Failed to decode(..)");

    assert_eq!(record.tag, 0x0B);
    assert!(record.tag().is_err());
}

#[test]
fn test_decode_read_body_must_match_length() {
    let mut bytes = Record::new(0x05, 7, 0, 0)
        .with_requested_len(4)
        .encode()
        .expect("Failed to encode()")
        .to_vec();
    bytes.extend_from_slice(&[0, 0]);

    assert_eq!(
        Record::decode(&bytes),
        Err(WireError::LengthMismatch {
            declared: 4,
            actual: 2,
        })
    );
}

#[test]
fn test_decode_read_length_beyond_capacity_kept() {
    let bytes = Record::new(0x05, 7, 0, 0)
        .with_requested_len(MAX_PAYLOAD as u32 + 1)
        .encode()
        .expect("Failed to encode()");

    let record = Record::decode(&bytes).expect("Failed to decode(..)");

    assert_eq!(record.requested_len, MAX_PAYLOAD as u32 + 1);
}

// =============================================================================
// nak()
// =============================================================================

#[test]
fn test_nak_echoes_header_without_payload() {
    let record = Record::new(0x06, 7, 0x20, 0).with_payload(b"secret".to_vec());

    let nak = record.nak();

    assert_eq!(nak.tag, 0x06 | NAK);
    assert_eq!((nak.pid, nak.field2, nak.field3), (7, 0x20, 0));
    assert_eq!(nak.data_len(), 0);
}

#[test]
fn test_debug_hides_payload() {
    let record = Record::new(0x06, 7, 0, 0).with_payload(b"hunter2".to_vec());

    let debug = format!("{record:?}");

    assert!(debug.contains("data_len: 7"));
    assert!(!debug.contains("104"));
}

#[test]
fn test_decode_header_ignores_body() {
    let mut bytes = Record::new(0x06, 7, 0x10, 0)
        .with_payload(vec![1, 2, 3])
        .encode()
        .expect("Failed to encode()")
        .to_vec();
    bytes.pop();

    let header = Record::decode_header(&bytes).expect("Failed to decode_header(..)");

    assert!(Record::decode(&bytes).is_err());
    assert_eq!((header.tag, header.pid, header.field2), (0x06, 7, 0x10));
    assert_eq!(header.data_len(), 0);
}
