// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Process registry for policy-gated secure memory.
//!
//! Each registered pid owns a [`ProcessContext`]: a zeroizing arena, the
//! segment list partitioning it, and the compiled policies its
//! allocations are bound to. The [`Registry`] maps pids to contexts and
//! serializes operations per pid.
//!
//! # Example
//!
//! ```rust
//! use secmem_registry::{ErrorKind, Registry, RegistryError};
//!
//! fn example() -> Result<(), RegistryError> {
//!     let registry = Registry::new();
//!     registry.load(7, 0x100, &["RW"])?;
//!
//!     let addr = registry.alloc(7, 0x10, 0)?;
//!     assert_eq!(addr, 0);
//!
//!     // "RW" demands a read first.
//!     let error = registry.write(7, addr, b"key!").unwrap_err();
//!     assert_eq!(error.kind(), ErrorKind::PolicyViolation);
//!
//!     registry.dealloc(7, addr)?;
//!     registry.unload(7)
//! }
//! # example().unwrap();
//! ```

#[cfg(test)]
mod tests;

mod context;
mod error;
mod registry;
mod view;

pub use context::ProcessContext;
pub use error::{ErrorKind, RegistryError};
pub use registry::{Registry, RegistryOptions};
pub use view::{FIELD_SEPARATOR, PolicyView, ProcessView, RECORD_SEPARATOR, SegmentView};

/// Client process identifier.
pub type Pid = u32;
