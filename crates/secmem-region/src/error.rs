// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for secmem-region.

use thiserror::Error;

/// Errors from arenas and segment lists.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum RegionError {
    /// No free segment can hold the request.
    #[error("out of memory: requested {requested} bytes, largest free segment is {largest_free}")]
    OutOfMemory { requested: usize, largest_free: usize },

    /// Zero-sized allocations are refused.
    #[error("zero-sized allocation")]
    ZeroSize,

    /// No segment starts exactly at `offset`.
    #[error("no segment at offset {offset:#x}")]
    NotFound { offset: usize },

    /// The segment at `offset` is not allocated.
    #[error("segment at offset {offset:#x} is not in use")]
    NotInUse { offset: usize },

    /// A byte range falls outside the arena.
    #[error("range {offset:#x}+{len:#x} exceeds arena of {arena_len:#x} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        arena_len: usize,
    },

    /// `mlock` refused to pin the arena.
    #[error("mlock failed")]
    Lock,
}
