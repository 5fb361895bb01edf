// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Per-allocation access state machines.

use std::sync::Arc;

use crate::descriptor::PolicyDescriptor;
use crate::error::PolicyError;
use crate::{SINK_STATE, START_STATE, StateId};

/// Appended to a cloned machine's comment.
pub const CLONE_MARK: char = '@';

/// A byte-level access against secure memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Data leaves the allocation.
    Read,
    /// Data enters the allocation.
    Write,
}

impl Access {
    /// The policy symbol this access is fed to a machine as.
    pub const fn symbol(self) -> u8 {
        match self {
            Self::Read => b'R',
            Self::Write => b'W',
        }
    }
}

/// Outcome of [`AccessState::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The machine is outside the sink.
    Allowed,
    /// The machine reached the sink. Terminal for this instance.
    Rejected,
}

/// A running policy machine bound to one [`PolicyDescriptor`].
///
/// Dropping a bound state unbinds it, so a descriptor's count never leaks.
pub struct AccessState {
    descriptor: Option<Arc<PolicyDescriptor>>,
    current: StateId,
    previous: StateId,
    comment: Option<String>,
}

impl AccessState {
    /// Binds a fresh machine to `descriptor`, starting at [`START_STATE`].
    ///
    /// Fails if the descriptor was already unloaded.
    pub fn bind(descriptor: &Arc<PolicyDescriptor>) -> Result<Self, PolicyError> {
        descriptor.acquire()?;

        Ok(Self {
            descriptor: Some(Arc::clone(descriptor)),
            current: START_STATE,
            previous: SINK_STATE,
            comment: None,
        })
    }

    /// Releases the descriptor and parks the machine in the sink.
    pub fn unbind(&mut self) -> Result<(), PolicyError> {
        let descriptor = self.descriptor.take().ok_or(PolicyError::NotBound)?;
        descriptor.release();

        self.current = SINK_STATE;
        self.previous = SINK_STATE;
        Ok(())
    }

    /// Whether the machine is bound to a descriptor.
    pub fn is_loaded(&self) -> bool {
        self.descriptor.is_some()
    }

    /// The bound descriptor, if any.
    pub fn descriptor(&self) -> Option<&Arc<PolicyDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Current state.
    pub fn current(&self) -> StateId {
        self.current
    }

    /// State before the last step.
    pub fn previous(&self) -> StateId {
        self.previous
    }

    /// Advances on raw input `byte`. Unmapped input and unbound machines
    /// go to the sink.
    #[inline]
    pub fn step(&mut self, byte: u8) {
        self.previous = self.current;
        self.current = match &self.descriptor {
            Some(descriptor) => descriptor.next_state(self.current, byte),
            None => SINK_STATE,
        };
    }

    /// Advances on an access event.
    #[inline]
    pub fn step_access(&mut self, access: Access) {
        self.step(access.symbol());
    }

    /// [`Verdict::Allowed`] iff the machine is not in the sink.
    #[inline]
    pub fn validate(&self) -> Verdict {
        if self.current == SINK_STATE {
            Verdict::Rejected
        } else {
            Verdict::Allowed
        }
    }

    /// Returns to the previous state. Not used on the read/write path:
    /// a rejected access stays rejected.
    pub fn step_back(&mut self) {
        self.current = self.previous;
        self.previous = SINK_STATE;
    }

    /// Restarts the machine at [`START_STATE`].
    pub fn reload(&mut self) {
        if self.is_loaded() {
            self.current = START_STATE;
            self.previous = SINK_STATE;
        }
    }

    /// Forces the machine into the sink with no way to step back.
    pub fn invalidate(&mut self) {
        self.current = SINK_STATE;
        self.previous = SINK_STATE;
    }

    /// Descriptive comment attached by tooling.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Attaches a descriptive comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }
}

impl Clone for AccessState {
    /// Duplicates the machine state and binding. The data the machine
    /// guards is not duplicated.
    fn clone(&self) -> Self {
        // A bound descriptor cannot be unloaded, so retaining it again
        // cannot fail.
        if let Some(descriptor) = &self.descriptor {
            descriptor.retain();
        }

        Self {
            descriptor: self.descriptor.clone(),
            current: self.current,
            previous: self.previous,
            comment: self.comment.as_ref().map(|comment| {
                let mut marked = comment.clone();
                marked.push(CLONE_MARK);
                marked
            }),
        }
    }
}

impl Drop for AccessState {
    fn drop(&mut self) {
        if let Some(descriptor) = self.descriptor.take() {
            descriptor.release();
        }
    }
}

impl core::fmt::Debug for AccessState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessState")
            .field(
                "policy",
                &self.descriptor.as_ref().map(|descriptor| descriptor.comment()),
            )
            .field("current", &self.current)
            .field("previous", &self.previous)
            .finish()
    }
}
