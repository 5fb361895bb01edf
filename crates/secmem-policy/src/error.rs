// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for secmem-policy.
use thiserror::Error;

/// Errors raised while compiling, loading, or binding a policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The expression contains no input at all.
    #[error("policy expression is empty")]
    Empty,

    /// The expression exceeds [`MAX_EXPRESSION_LEN`](crate::MAX_EXPRESSION_LEN).
    #[error("policy expression is {len} bytes, limit is {limit}")]
    TooLong {
        /// Length of the rejected expression.
        len: usize,
        /// Maximum accepted length.
        limit: usize,
    },

    /// A byte the grammar does not allow at this position.
    #[error("unexpected {found:?} at position {position}, expected {expected}")]
    UnexpectedByte {
        /// The offending byte, rendered as a char.
        found: char,
        /// Offset of the byte in the source expression.
        position: usize,
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// The expression ended while the parser still expected input.
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// Input left over after a complete expression was parsed.
    #[error("trailing input at position {position}")]
    TrailingInput {
        /// Offset of the first unconsumed byte.
        position: usize,
    },

    /// The automaton has no transition out of the sink on any symbol.
    #[error("policy compiles to zero active symbols")]
    NoActiveSymbols,

    /// The deterministic automaton is larger than the table can index.
    #[error("policy needs {states} states, limit is {limit}")]
    TooManyStates {
        /// States produced so far when the limit was hit.
        states: usize,
        /// Maximum number of states.
        limit: usize,
    },

    /// Attempted to unload a descriptor that access states still reference.
    #[error("descriptor still bound by {bindings} access state(s)")]
    DescriptorInUse {
        /// Outstanding bindings.
        bindings: usize,
    },

    /// Attempted to bind a descriptor that was already unloaded.
    #[error("descriptor has been unloaded")]
    DescriptorUnloaded,

    /// Attempted to unbind an access state that is not bound.
    #[error("access state is not bound to a descriptor")]
    NotBound,
}
