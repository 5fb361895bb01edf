// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Policy compiler: regex text → dense DFA transition table.
//!
//! Pipeline: [`parser`] (text → AST) → [`nfa`] (Thompson construction)
//! → [`dfa`] (subset construction) → [`CompiledPolicy`] (flattened table
//! with a reserved sink row).

mod dfa;
mod nfa;
mod parser;

use crate::alphabet::AlphabetMap;
use crate::error::PolicyError;
use crate::{SINK_STATE, StateId};

use dfa::Dfa;
use nfa::Nfa;

/// Longest expression accepted by [`compile`], in bytes.
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Largest number of non-sink states a compiled policy may have.
pub const MAX_STATES: usize = u16::MAX as usize;

/// The compiled form of a policy expression.
///
/// `table` is row-major with `symbol_count` columns and one row per state,
/// row 0 being the sink (all zeros).
#[derive(Clone, PartialEq, Eq)]
pub struct CompiledPolicy {
    symbol_count: usize,
    alphabet: AlphabetMap,
    table: Box<[StateId]>,
    accepting: Box<[bool]>,
}

impl CompiledPolicy {
    /// Number of distinct active input symbols (always ≥ 1).
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// The raw byte → symbol index map.
    pub fn alphabet(&self) -> &AlphabetMap {
        &self.alphabet
    }

    /// The dense `states × symbol_count` transition table.
    pub fn table(&self) -> &[StateId] {
        &self.table
    }

    /// Number of states including the sink.
    pub fn state_count(&self) -> usize {
        self.table.len() / self.symbol_count
    }

    /// Whether `state` completes a full match of the expression.
    ///
    /// Enforcement only cares about reaching the sink; acceptance is
    /// reported for inspection.
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting
            .get(state as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Transition taken from `state` on raw input `byte`.
    #[inline(always)]
    pub fn next(&self, state: StateId, byte: u8) -> StateId {
        let Some(symbol) = self.alphabet.symbol_of(byte) else {
            return SINK_STATE;
        };

        self.table
            .get(state as usize * self.symbol_count + symbol)
            .copied()
            .unwrap_or(SINK_STATE)
    }

    fn from_dfa(dfa: &Dfa) -> Result<Self, PolicyError> {
        let mut symbols: Vec<u8> = dfa
            .transitions
            .iter()
            .flat_map(|row| row.keys().copied())
            .collect();
        symbols.sort_unstable();
        symbols.dedup();

        if symbols.is_empty() {
            return Err(PolicyError::NoActiveSymbols);
        }

        let alphabet = AlphabetMap::from_sorted(&symbols);
        let symbol_count = symbols.len();

        let rows = dfa.len() + 1;
        let mut table = vec![SINK_STATE; rows * symbol_count].into_boxed_slice();
        let mut accepting = vec![false; rows].into_boxed_slice();

        for (index, row) in dfa.transitions.iter().enumerate() {
            let state = index + 1;
            accepting[state] = dfa.accepting[index];

            for (&byte, &target) in row {
                if let Some(symbol) = alphabet.symbol_of(byte) {
                    table[state * symbol_count + symbol] = target;
                }
            }
        }

        Ok(Self {
            symbol_count,
            alphabet,
            table,
            accepting,
        })
    }
}

impl core::fmt::Debug for CompiledPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompiledPolicy")
            .field("symbol_count", &self.symbol_count)
            .field("states", &self.state_count())
            .field("alphabet", &self.alphabet)
            .finish_non_exhaustive()
    }
}

/// Compiles a policy expression into a transition table.
///
/// Fails without allocating anything persistent when the expression is
/// empty, too long, malformed, or yields no active symbols.
///
/// # Example
///
/// ```rust
/// use secmem_policy::{START_STATE, SINK_STATE, compile};
///
/// let policy = compile(b"R(WR)*W?RW").unwrap();
/// assert_eq!(policy.symbol_count(), 2);
///
/// // The first access must be a read.
/// assert_eq!(policy.next(START_STATE, b'W'), SINK_STATE);
/// assert_ne!(policy.next(START_STATE, b'R'), SINK_STATE);
/// ```
pub fn compile(expression: &[u8]) -> Result<CompiledPolicy, PolicyError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(PolicyError::TooLong {
            len: expression.len(),
            limit: MAX_EXPRESSION_LEN,
        });
    }

    let ast = parser::parse(expression)?;
    let nfa = Nfa::from_ast(&ast);
    let dfa = Dfa::from_nfa(&nfa, MAX_STATES)?;

    CompiledPolicy::from_dfa(&dfa)
}
