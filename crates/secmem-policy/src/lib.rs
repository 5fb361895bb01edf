// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Access policies for secure memory allocations.
//!
//! A policy is a regular expression over access symbols (`R` for read,
//! `W` for write) describing every access sequence an allocation permits.
//! Policies are compiled once into a dense DFA transition table and then
//! enforced per allocation by an [`AccessState`].
//!
//! # Layers
//!
//! - [`compile`]: regex text → [`CompiledPolicy`] (alphabet map + table)
//! - [`PolicyDescriptor`]: shareable compiled policy with a binding count
//! - [`AccessState`]: one running machine per allocation
//!
//! # States
//!
//! State [`SINK_STATE`] (0) is the absorbing invalid state every table
//! reserves; [`START_STATE`] (1) is where every fresh machine begins.
//!
//! # Example
//!
//! ```rust
//! use secmem_policy::{Access, AccessState, PolicyDescriptor, PolicyError, Verdict};
//!
//! fn example() -> Result<(), PolicyError> {
//!     let descriptor = PolicyDescriptor::load(b"RW")?;
//!     let mut state = AccessState::bind(&descriptor)?;
//!
//!     state.step_access(Access::Read);
//!     assert_eq!(state.validate(), Verdict::Allowed);
//!
//!     state.step_access(Access::Write);
//!     assert_eq!(state.validate(), Verdict::Allowed);
//!
//!     // Nothing may follow "RW".
//!     state.step_access(Access::Read);
//!     assert_eq!(state.validate(), Verdict::Rejected);
//!
//!     state.unbind()?;
//!     descriptor.unload()
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod access;
mod alphabet;
mod compiler;
mod descriptor;
mod error;

pub use access::{Access, AccessState, CLONE_MARK, Verdict};
pub use alphabet::{ALPHABET_SIZE, AlphabetMap, NO_SYMBOL};
pub use compiler::{CompiledPolicy, MAX_EXPRESSION_LEN, MAX_STATES, compile};
pub use descriptor::PolicyDescriptor;
pub use error::PolicyError;

/// Index of a state in a compiled transition table.
pub type StateId = u32;

/// The absorbing invalid state. Every unmapped input and every missing
/// transition leads here, and no transition leaves it.
pub const SINK_STATE: StateId = 0;

/// The state every freshly bound machine starts in.
pub const START_STATE: StateId = 1;
