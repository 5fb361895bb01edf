// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Assertions over offset-ordered segment layouts.

/// A crate-agnostic view of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub size: usize,
    pub used: bool,
}

/// Asserts that `spans` cover `0..arena_len` exactly, in order, with no
/// gaps, overlaps, or empty spans.
pub fn assert_partition(spans: &[Span], arena_len: usize) {
    assert!(!spans.is_empty(), "segment list is empty");
    assert_eq!(spans[0].offset, 0, "head segment does not start at 0");

    let mut expected = 0;
    for (index, span) in spans.iter().enumerate() {
        assert_eq!(
            span.offset, expected,
            "segment {index} starts at {:#x}, expected {:#x}",
            span.offset, expected
        );
        assert!(span.size > 0, "segment {index} is empty");
        expected = span.offset + span.size;
    }

    assert_eq!(
        expected, arena_len,
        "segments end at {:#x}, arena is {:#x}",
        expected, arena_len
    );
}

/// Asserts that no two free spans are adjacent.
pub fn assert_coalesced(spans: &[Span]) {
    for (index, pair) in spans.windows(2).enumerate() {
        assert!(
            pair[0].used || pair[1].used,
            "free segments {} and {} are adjacent",
            index,
            index + 1
        );
    }
}
