// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for secmem-registry.

use thiserror::Error;

use secmem_policy::{Access, PolicyError};
use secmem_region::RegionError;

use crate::Pid;

/// Coarse failure classes reported at the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is invalid.
    Malformed,
    /// Unregistered pid or no allocation at the address.
    NotFound,
    /// The arena cannot satisfy the request.
    Capacity,
    /// The access state machine rejected the access.
    PolicyViolation,
    /// A policy expression failed to compile.
    Compile,
    /// Teardown of an allocation or process left failures behind.
    Cleanup,
    /// Internal synchronization failure.
    Internal,
}

/// Errors from registry and process-context operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A load named a pid that is already registered.
    #[error("process {pid} is already registered")]
    AlreadyRegistered { pid: Pid },

    /// No process is registered under the pid.
    #[error("process {pid} is not registered")]
    NotRegistered { pid: Pid },

    /// A load asked for an empty arena.
    #[error("arena size must be non-zero")]
    EmptyArena,

    /// A load carried no policies.
    #[error("at least one policy is required")]
    NoPolicies,

    /// The policy at `index` did not compile.
    #[error("policy {index} failed to compile: {source}")]
    Compile {
        index: usize,
        #[source]
        source: PolicyError,
    },

    /// An alloc named a policy id that was never loaded.
    #[error("policy id {policy_id} out of range ({count} loaded)")]
    UnknownPolicy { policy_id: usize, count: usize },

    /// A read or write of zero bytes.
    #[error("zero-length access at {addr:#x}")]
    EmptyAccess { addr: usize },

    /// A read or write longer than the addressed segment.
    #[error("access of {len} bytes exceeds segment of {size} bytes at {addr:#x}")]
    LengthExceedsSegment { addr: usize, len: usize, size: usize },

    /// The segment has no loaded access machine.
    #[error("segment at {addr:#x} has no bound policy")]
    Unbound { addr: usize },

    /// The segment's policy refused the access.
    #[error("{access:?} at {addr:#x} rejected by policy '{policy}'")]
    PolicyViolation {
        addr: usize,
        access: Access,
        policy: String,
    },

    /// Allocator or arena failure.
    #[error("RegionError: {0}")]
    Region(#[from] RegionError),

    /// Descriptor or binding failure.
    #[error("PolicyError: {0}")]
    Policy(#[from] PolicyError),

    /// Teardown finished but some steps failed.
    #[error("cleanup of process {pid} left {} failure(s)", failures.len())]
    Cleanup {
        pid: Pid,
        failures: Vec<RegistryError>,
    },

    /// A registry or process lock was poisoned.
    #[error("mutex poisoned")]
    MutexPoisoned,
}

impl RegistryError {
    /// Classifies the error for the reply boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered { .. }
            | Self::EmptyArena
            | Self::NoPolicies
            | Self::UnknownPolicy { .. }
            | Self::EmptyAccess { .. }
            | Self::LengthExceedsSegment { .. } => ErrorKind::Malformed,

            Self::NotRegistered { .. } | Self::Unbound { .. } => ErrorKind::NotFound,

            Self::PolicyViolation { .. } => ErrorKind::PolicyViolation,
            Self::Compile { .. } => ErrorKind::Compile,
            Self::Cleanup { .. } => ErrorKind::Cleanup,
            Self::MutexPoisoned => ErrorKind::Internal,

            Self::Region(error) => match error {
                RegionError::OutOfMemory { .. } | RegionError::Lock => ErrorKind::Capacity,
                RegionError::NotFound { .. } | RegionError::NotInUse { .. } => {
                    ErrorKind::NotFound
                }
                RegionError::ZeroSize | RegionError::OutOfBounds { .. } => ErrorKind::Malformed,
            },

            Self::Policy(error) => match error {
                PolicyError::DescriptorInUse { .. } | PolicyError::NotBound => ErrorKind::Cleanup,
                PolicyError::DescriptorUnloaded => ErrorKind::NotFound,
                _ => ErrorKind::Compile,
            },
        }
    }
}
