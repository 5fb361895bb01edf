// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Secure memory regions: a zeroizing [`Arena`] per process and a
//! first-fit [`SegmentList`] partitioning it.
//!
//! The two are independent. The arena owns bytes and knows nothing of
//! allocations; the segment list owns offsets and knows nothing of bytes.
//! Callers zero the segment's byte range on both allocation and release.
//!
//! # Example
//!
//! ```rust
//! use secmem_region::{Arena, RegionError, SegmentList};
//!
//! fn example() -> Result<(), RegionError> {
//!     let mut arena = Arena::new(0x100);
//!     let mut segments: SegmentList<()> = SegmentList::new(arena.len());
//!
//!     let offset = segments.allocate(0x10)?;
//!     assert_eq!(offset, 0);
//!
//!     arena.write(offset, b"key!")?;
//!     assert_eq!(arena.read(offset, 4)?, b"key!");
//!
//!     arena.zero_range(offset, 0x10)?;
//!     segments.deallocate(offset)?;
//!     assert_eq!(segments.len(), 1);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#[cfg(test)]
mod tests;

mod arena;
mod error;
mod segment;

pub use arena::Arena;
pub use error::RegionError;
pub use segment::{Segment, SegmentList};
