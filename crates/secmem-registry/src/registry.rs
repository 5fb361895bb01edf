// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Registry - pid → process context map with per-pid serialization.
//!
//! Insertion and removal take the map's write lock, so concurrent loads
//! and unloads of the same pid are atomic. Operations on a registered
//! process hold only that process's mutex; different pids never contend
//! beyond the brief read lock used to look them up.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::Pid;
use crate::context::ProcessContext;
use crate::error::{ErrorKind, RegistryError};
use crate::view::ProcessView;

/// Registry-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// `mlock` each arena at load. Best-effort: a refused lock is logged
    /// and the process is registered unlocked.
    pub lock_memory: bool,
}

type SharedContext = Arc<Mutex<ProcessContext>>;

/// Every registered process, keyed by pid.
#[derive(Debug, Default)]
pub struct Registry {
    processes: RwLock<HashMap<Pid, SharedContext>>,
    options: RegistryOptions,
}

impl Registry {
    /// An empty registry with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with `options`.
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            processes: RwLock::default(),
            options,
        }
    }

    /// The options the registry was built with.
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Number of registered processes.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read_map()?.len())
    }

    /// Whether no process is registered.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.read_map()?.is_empty())
    }

    /// Whether `pid` is registered.
    pub fn contains(&self, pid: Pid) -> Result<bool, RegistryError> {
        Ok(self.read_map()?.contains_key(&pid))
    }

    /// Registered pids in ascending order.
    pub fn pids(&self) -> Result<Vec<Pid>, RegistryError> {
        let mut pids: Vec<Pid> = self.read_map()?.keys().copied().collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Registers `pid` with an arena of `arena_size` bytes and the given
    /// policies (ids assigned in input order).
    ///
    /// All-or-nothing: a duplicate pid or any failing policy leaves the
    /// registry unchanged.
    pub fn load<P: AsRef<[u8]>>(
        &self,
        pid: Pid,
        arena_size: usize,
        policies: &[P],
    ) -> Result<(), RegistryError> {
        if self.contains(pid)? {
            return Err(RegistryError::AlreadyRegistered { pid });
        }

        let mut context = ProcessContext::new(pid, arena_size, policies)?;

        if self.options.lock_memory {
            if let Err(error) = context.lock_arena() {
                warn!(pid, arena_size, %error, "arena not locked");
            }
        }

        let locked = context.is_locked();

        match self.write_map()?.entry(pid) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyRegistered { pid }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(context)));
            }
        }

        debug!(pid, arena_size, policies = policies.len(), locked, "process loaded");
        Ok(())
    }

    /// Tears down and removes `pid`.
    ///
    /// The process is removed even when teardown reports failures; those
    /// are returned as [`RegistryError::Cleanup`].
    pub fn unload(&self, pid: Pid) -> Result<(), RegistryError> {
        let shared = self
            .write_map()?
            .remove(&pid)
            .ok_or(RegistryError::NotRegistered { pid })?;

        let failures = {
            let mut context = shared.lock().map_err(|_| RegistryError::MutexPoisoned)?;
            context.teardown()
        };

        if !failures.is_empty() {
            warn!(pid, failures = failures.len(), "process unloaded with cleanup failures");
            return Err(RegistryError::Cleanup { pid, failures });
        }

        debug!(pid, "process unloaded");
        Ok(())
    }

    /// Allocates `size` bytes under policy `policy_id`. Returns the offset.
    pub fn alloc(&self, pid: Pid, size: usize, policy_id: usize) -> Result<usize, RegistryError> {
        let offset = self.with_context(pid, |context| context.alloc(size, policy_id))?;

        debug!(pid, offset, size, policy_id, "segment allocated");
        Ok(offset)
    }

    /// Releases the allocation starting exactly at `addr`.
    pub fn dealloc(&self, pid: Pid, addr: usize) -> Result<(), RegistryError> {
        self.with_context(pid, |context| context.dealloc(addr))?;

        debug!(pid, addr, "segment released");
        Ok(())
    }

    /// Reads `len` bytes from the allocation at `addr`, subject to its
    /// policy.
    pub fn read(
        &self,
        pid: Pid,
        addr: usize,
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, RegistryError> {
        self.with_context(pid, |context| context.read(addr, len))
    }

    /// Writes `data` to the allocation at `addr`, subject to its policy.
    pub fn write(&self, pid: Pid, addr: usize, data: &[u8]) -> Result<(), RegistryError> {
        self.with_context(pid, |context| context.write(addr, data))
    }

    /// Arena size of a registered process.
    pub fn arena_size(&self, pid: Pid) -> Result<usize, RegistryError> {
        self.with_context(pid, |context| Ok(context.arena_size()))
    }

    /// Snapshot of `pid`'s arena, policies and segments.
    pub fn view(&self, pid: Pid) -> Result<ProcessView, RegistryError> {
        self.with_context(pid, |context| Ok(context.view()))
    }

    /// Runs `f` with exclusive access to `pid`'s context.
    fn with_context<T>(
        &self,
        pid: Pid,
        f: impl FnOnce(&mut ProcessContext) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let shared = self
            .read_map()?
            .get(&pid)
            .cloned()
            .ok_or(RegistryError::NotRegistered { pid })?;

        let mut context = shared.lock().map_err(|_| RegistryError::MutexPoisoned)?;
        let result = f(&mut *context);

        if let Err(error) = &result {
            match error.kind() {
                ErrorKind::PolicyViolation | ErrorKind::Cleanup => {
                    warn!(pid, %error, "operation rejected");
                }
                _ => debug!(pid, %error, "operation failed"),
            }
        }

        result
    }

    fn read_map(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Pid, SharedContext>>, RegistryError> {
        self.processes
            .read()
            .map_err(|_| RegistryError::MutexPoisoned)
    }

    fn write_map(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Pid, SharedContext>>, RegistryError> {
        self.processes
            .write()
            .map_err(|_| RegistryError::MutexPoisoned)
    }
}
