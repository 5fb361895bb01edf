// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Arena - fixed-size, zeroizing backing store for one process.
//!
//! The arena is allocated once and never resized or moved. Every byte is
//! overwritten with zeros on drop, and pages are unpinned if they were
//! locked with [`Arena::lock`].

use core::ops::Range;

use zeroize::Zeroize;

use crate::error::RegionError;

/// Fixed-size byte region, zeroized on drop.
pub struct Arena {
    bytes: Box<[u8]>,
    locked: bool,
}

impl Arena {
    /// Allocates a zero-filled arena of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
            locked: false,
        }
    }

    /// Pins the arena in RAM so it is never written to swap.
    ///
    /// Best-effort: fails under `RLIMIT_MEMLOCK` or on platforms without
    /// `mlock`. Locking twice is a no-op.
    pub fn lock(&mut self) -> Result<(), RegionError> {
        if self.locked || self.bytes.is_empty() {
            return Ok(());
        }

        if !mlock(&self.bytes) {
            return Err(RegionError::Lock);
        }

        self.locked = true;
        Ok(())
    }

    /// Whether [`lock`](Self::lock) succeeded.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the arena has zero length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole arena.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>, RegionError> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .map(|end| offset..end)
            .ok_or(RegionError::OutOfBounds {
                offset,
                len,
                arena_len: self.bytes.len(),
            })
    }

    /// Borrows `len` bytes starting at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8], RegionError> {
        let range = self.range(offset, len)?;
        Ok(&self.bytes[range])
    }

    /// Copies `data` into the arena at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), RegionError> {
        let range = self.range(offset, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Overwrites `len` bytes at `offset` with zeros.
    pub fn zero_range(&mut self, offset: usize, len: usize) -> Result<(), RegionError> {
        let range = self.range(offset, len)?;
        self.bytes[range].zeroize();
        Ok(())
    }

    /// Whether every byte is zero.
    pub fn is_zeroized(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

#[cfg(unix)]
fn mlock(bytes: &[u8]) -> bool {
    // SAFETY: the range is exactly a live allocation.
    unsafe { libc::mlock(bytes.as_ptr().cast(), bytes.len()) == 0 }
}

#[cfg(not(unix))]
fn mlock(_bytes: &[u8]) -> bool {
    false
}

#[cfg(unix)]
fn munlock(bytes: &[u8]) {
    // SAFETY: same range that was passed to mlock.
    unsafe { libc::munlock(bytes.as_ptr().cast(), bytes.len()) };
}

#[cfg(not(unix))]
fn munlock(_bytes: &[u8]) {}

impl Zeroize for Arena {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.bytes.zeroize();

        if self.locked {
            munlock(&self.bytes);
        }
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
