// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Raw input byte → internal symbol index mapping.

/// Number of raw input bytes an alphabet map covers.
pub const ALPHABET_SIZE: usize = 256;

/// Marker for raw bytes the policy never mentions.
///
/// Lives in symbol space, not state space: it is never used as a table
/// column. Lookups that hit it resolve to [`SINK_STATE`](crate::SINK_STATE).
pub const NO_SYMBOL: u8 = u8::MAX;

/// Fixed-size map from raw input bytes to compact symbol indices.
#[derive(Clone, PartialEq, Eq)]
pub struct AlphabetMap {
    map: [u8; ALPHABET_SIZE],
}

impl AlphabetMap {
    /// Builds a map assigning indices `0..symbols.len()` to `symbols` in order.
    ///
    /// `symbols` must be sorted, unique, and shorter than [`NO_SYMBOL`].
    pub(crate) fn from_sorted(symbols: &[u8]) -> Self {
        debug_assert!(symbols.len() < NO_SYMBOL as usize);
        debug_assert!(symbols.windows(2).all(|w| w[0] < w[1]));

        let mut map = [NO_SYMBOL; ALPHABET_SIZE];
        for (index, &byte) in symbols.iter().enumerate() {
            map[byte as usize] = index as u8;
        }

        Self { map }
    }

    /// Returns the symbol index for `byte`, or `None` if the byte is unmapped.
    #[inline(always)]
    pub fn symbol_of(&self, byte: u8) -> Option<usize> {
        match self.map[byte as usize] {
            NO_SYMBOL => None,
            index => Some(index as usize),
        }
    }

    /// Returns the raw map entry for `byte` ([`NO_SYMBOL`] when unmapped).
    #[inline(always)]
    pub fn raw(&self, byte: u8) -> u8 {
        self.map[byte as usize]
    }

    /// Iterates over `(byte, symbol_index)` for every mapped byte.
    pub fn mapped(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.map
            .iter()
            .enumerate()
            .filter(|(_, index)| **index != NO_SYMBOL)
            .map(|(byte, index)| (byte as u8, *index as usize))
    }
}

impl core::fmt::Debug for AlphabetMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.mapped().map(|(byte, index)| (char::from(byte), index)))
            .finish()
    }
}
