// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::error::WireError;
use crate::tag::{ACK, NAK, OpTag, Status, Tag, strip_modifiers};

#[test]
fn test_op_tag_values() {
    let raw: Vec<u32> = OpTag::ALL.iter().map(|op| op.as_u32()).collect();

    assert_eq!(raw, (0..=8).collect::<Vec<u32>>());
    assert_eq!(OpTag::try_from(5), Ok(OpTag::Read));
    assert_eq!(OpTag::try_from(9), Err(WireError::UnknownTag(9)));
}

#[test]
fn test_tag_modifiers() {
    assert_eq!(Tag::request(OpTag::Alloc).to_u32(), 3);
    assert_eq!(Tag::ack(OpTag::Alloc).to_u32(), 3 | ACK);
    assert_eq!(Tag::nak(OpTag::Alloc).to_u32(), 3 | NAK);

    assert_eq!(Tag::from_u32(0x13), Ok(Tag::ack(OpTag::Alloc)));
    assert_eq!(
        Tag::from_u32(0x27).map(|tag| tag.status),
        Ok(Status::Nak)
    );
    assert!(Tag::from_u32(0x11).is_ok_and(Tag::is_reply));
    assert!(!Tag::request(OpTag::Nil).is_reply());
}

#[test]
fn test_tag_both_modifiers_rejected() {
    assert_eq!(Tag::from_u32(0x31), Err(WireError::UnknownTag(0x31)));
}

#[test]
fn test_tag_unknown_op_with_modifier() {
    assert_eq!(Tag::from_u32(0x19), Err(WireError::UnknownTag(9)));
    assert_eq!(strip_modifiers(0x2A), 0x0A);
}
