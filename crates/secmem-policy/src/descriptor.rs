// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Shareable compiled policies with binding counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::compiler::{CompiledPolicy, compile};
use crate::error::PolicyError;
use crate::StateId;

/// A compiled policy shared by every [`AccessState`](crate::AccessState)
/// bound to it.
///
/// The binding count is only changed by `AccessState::bind`/`unbind`
/// (and clones/drops of bound states). The owner serializes those calls
/// with [`unload`](PolicyDescriptor::unload); the atomics only make the
/// descriptor shareable across threads, not lock-free.
pub struct PolicyDescriptor {
    policy: CompiledPolicy,
    comment: String,
    bindings: AtomicUsize,
    unloaded: AtomicBool,
}

impl PolicyDescriptor {
    /// Compiles `expression` into a descriptor with zero bindings.
    ///
    /// The expression text is kept as the descriptor's comment.
    pub fn load(expression: &[u8]) -> Result<Arc<Self>, PolicyError> {
        let policy = compile(expression)?;

        Ok(Arc::new(Self {
            policy,
            comment: String::from_utf8_lossy(expression).into_owned(),
            bindings: AtomicUsize::new(0),
            unloaded: AtomicBool::new(false),
        }))
    }

    /// Retires the descriptor so it can no longer be bound.
    ///
    /// Fails while any access state is still bound to it.
    pub fn unload(&self) -> Result<(), PolicyError> {
        let bindings = self.ref_count();
        if bindings != 0 {
            return Err(PolicyError::DescriptorInUse { bindings });
        }

        self.unloaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether [`unload`](Self::unload) has succeeded.
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::Acquire)
    }

    /// Number of access states currently bound.
    pub fn ref_count(&self) -> usize {
        self.bindings.load(Ordering::Acquire)
    }

    /// The source expression.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The compiled transition table.
    pub fn policy(&self) -> &CompiledPolicy {
        &self.policy
    }

    /// Number of active input symbols.
    pub fn symbol_count(&self) -> usize {
        self.policy.symbol_count()
    }

    #[inline(always)]
    pub(crate) fn next_state(&self, state: StateId, byte: u8) -> StateId {
        self.policy.next(state, byte)
    }

    pub(crate) fn acquire(&self) -> Result<(), PolicyError> {
        if self.is_unloaded() {
            return Err(PolicyError::DescriptorUnloaded);
        }

        self.bindings.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Adds a binding for a clone of an already bound state.
    pub(crate) fn retain(&self) {
        self.bindings.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        let previous = self.bindings.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "descriptor binding count underflow");
    }
}

impl core::fmt::Debug for PolicyDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolicyDescriptor")
            .field("comment", &self.comment)
            .field("ref_count", &self.ref_count())
            .field("policy", &self.policy)
            .finish()
    }
}
