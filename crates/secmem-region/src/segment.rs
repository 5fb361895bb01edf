// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! First-fit segment lists over a fixed-size arena.
//!
//! A [`SegmentList`] partitions `0..arena_len` into contiguous
//! [`Segment`]s ordered by offset. Allocation splits the first free
//! segment large enough, keeping the used part at the low end; release
//! coalesces with free neighbours so two free segments are never adjacent.
//!
//! Segments are addressed by their starting offset only. Offsets are plain
//! integers; nothing holds a reference into the list across calls.

use crate::error::RegionError;

/// A contiguous span of the arena, free or in use.
///
/// A used segment may carry a payload (the per-allocation state its owner
/// attaches after allocation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<T> {
    offset: usize,
    size: usize,
    used: bool,
    payload: Option<T>,
}

impl<T> Segment<T> {
    fn free(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            used: false,
            payload: None,
        }
    }

    /// Start offset within the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Whether the segment is allocated.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// The attached payload, if any.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Mutable access to the attached payload.
    pub fn payload_mut(&mut self) -> Option<&mut T> {
        self.payload.as_mut()
    }

    /// Attaches `payload`, returning the previous one.
    pub fn attach(&mut self, payload: T) -> Option<T> {
        self.payload.replace(payload)
    }

    /// Detaches the payload, leaving the segment's used flag unchanged.
    pub fn detach(&mut self) -> Option<T> {
        self.payload.take()
    }
}

/// An offset-ordered partition of one arena.
#[derive(Debug, Clone)]
pub struct SegmentList<T> {
    segments: Vec<Segment<T>>,
    arena_len: usize,
}

impl<T> SegmentList<T> {
    /// A single free segment spanning `arena_len` bytes.
    pub fn new(arena_len: usize) -> Self {
        Self {
            segments: vec![Segment::free(0, arena_len)],
            arena_len,
        }
    }

    /// Size of the partitioned arena.
    pub fn arena_len(&self) -> usize {
        self.arena_len
    }

    /// Number of segments, free and used.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a list holds at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in offset order.
    pub fn segments(&self) -> &[Segment<T>] {
        &self.segments
    }

    /// Iterates segments in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment<T>> {
        self.segments.iter()
    }

    /// Mutably iterates segments in offset order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Segment<T>> {
        self.segments.iter_mut()
    }

    /// Number of free segments.
    pub fn free_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.used).count()
    }

    /// Number of used segments.
    pub fn used_count(&self) -> usize {
        self.segments.iter().filter(|s| s.used).count()
    }

    /// Size of the largest free segment, 0 if the arena is full.
    pub fn largest_free(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| !s.used)
            .map(|s| s.size)
            .max()
            .unwrap_or(0)
    }

    /// Marks `size` bytes of the first free segment that fits as used.
    ///
    /// Exact fits reuse the segment; larger ones are split with the used
    /// part at the lower offset. Returns the allocated offset.
    pub fn allocate(&mut self, size: usize) -> Result<usize, RegionError> {
        if size == 0 {
            return Err(RegionError::ZeroSize);
        }

        let index = self
            .segments
            .iter()
            .position(|s| !s.used && s.size >= size)
            .ok_or(RegionError::OutOfMemory {
                requested: size,
                largest_free: self.largest_free(),
            })?;

        let segment = &mut self.segments[index];
        let offset = segment.offset;

        if segment.size > size {
            let remainder = Segment::free(offset + size, segment.size - size);
            segment.size = size;
            self.segments.insert(index + 1, remainder);
        }

        self.segments[index].used = true;
        Ok(offset)
    }

    /// Frees the used segment starting exactly at `offset` and coalesces it
    /// with free neighbours. Returns its detached payload, if any.
    pub fn deallocate(&mut self, offset: usize) -> Result<Option<T>, RegionError> {
        let index = self.index_of(offset)?;

        let segment = &mut self.segments[index];
        if !segment.used {
            return Err(RegionError::NotInUse { offset });
        }

        segment.used = false;
        let payload = segment.payload.take();

        let mut index = index;

        if index > 0 && !self.segments[index - 1].used {
            let freed = self.segments.remove(index);
            self.segments[index - 1].size += freed.size;
            index -= 1;
        }

        if index + 1 < self.segments.len() && !self.segments[index + 1].used {
            let next = self.segments.remove(index + 1);
            self.segments[index].size += next.size;
        }

        Ok(payload)
    }

    /// The segment starting exactly at `offset`.
    pub fn find_by_offset(&self, offset: usize) -> Option<&Segment<T>> {
        self.index_of(offset).ok().map(|index| &self.segments[index])
    }

    /// Mutable access to the segment starting exactly at `offset`.
    pub fn find_by_offset_mut(&mut self, offset: usize) -> Option<&mut Segment<T>> {
        self.index_of(offset).ok().map(|index| &mut self.segments[index])
    }

    fn index_of(&self, offset: usize) -> Result<usize, RegionError> {
        self.segments
            .binary_search_by_key(&offset, |s| s.offset)
            .map_err(|_| RegionError::NotFound { offset })
    }
}
