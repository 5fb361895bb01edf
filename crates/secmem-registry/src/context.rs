// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ProcessContext - one client's arena, segments, and policies.
//!
//! Every operation here assumes exclusive access; the registry serializes
//! callers per pid.

use std::sync::Arc;

use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use secmem_policy::{Access, AccessState, PolicyDescriptor, Verdict};
use secmem_region::{Arena, RegionError, SegmentList};

use crate::Pid;
use crate::error::RegistryError;
use crate::view::{PolicyView, ProcessView, SegmentView};

/// State of one registered client process.
pub struct ProcessContext {
    pid: Pid,
    arena: Arena,
    segments: SegmentList<AccessState>,
    policies: Vec<Arc<PolicyDescriptor>>,
}

impl ProcessContext {
    /// Compiles `policies` in order (ids `0..N`) and allocates the arena.
    ///
    /// Nothing survives a failure: descriptors compiled before the failing
    /// one are dropped unbound.
    pub fn new<P: AsRef<[u8]>>(
        pid: Pid,
        arena_size: usize,
        policies: &[P],
    ) -> Result<Self, RegistryError> {
        if arena_size == 0 {
            return Err(RegistryError::EmptyArena);
        }
        if policies.is_empty() {
            return Err(RegistryError::NoPolicies);
        }

        let policies = policies
            .iter()
            .enumerate()
            .map(|(index, expression)| {
                PolicyDescriptor::load(expression.as_ref())
                    .map_err(|source| RegistryError::Compile { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pid,
            arena: Arena::new(arena_size),
            segments: SegmentList::new(arena_size),
            policies,
        })
    }

    /// Pins the arena in RAM. Best-effort.
    pub fn lock_arena(&mut self) -> Result<(), RegistryError> {
        Ok(self.arena.lock()?)
    }

    /// Owning process.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Arena size in bytes.
    pub fn arena_size(&self) -> usize {
        self.arena.len()
    }

    /// Whether the arena is pinned in RAM.
    pub fn is_locked(&self) -> bool {
        self.arena.is_locked()
    }

    /// Loaded policies, indexed by policy id.
    pub fn policies(&self) -> &[Arc<PolicyDescriptor>] {
        &self.policies
    }

    /// The arena's segment partition.
    pub fn segments(&self) -> &SegmentList<AccessState> {
        &self.segments
    }

    /// Bytes currently held by used segments.
    pub fn used_bytes(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.is_used())
            .map(|s| s.size())
            .sum()
    }

    /// Reserves `size` zeroed bytes governed by policy `policy_id`.
    pub fn alloc(&mut self, size: usize, policy_id: usize) -> Result<usize, RegistryError> {
        let descriptor = self
            .policies
            .get(policy_id)
            .cloned()
            .ok_or(RegistryError::UnknownPolicy {
                policy_id,
                count: self.policies.len(),
            })?;

        let offset = self.segments.allocate(size)?;
        self.arena.zero_range(offset, size)?;

        let state = match AccessState::bind(&descriptor) {
            Ok(state) => state,
            Err(error) => {
                self.segments.deallocate(offset)?;
                return Err(error.into());
            }
        };

        self.segments
            .find_by_offset_mut(offset)
            .ok_or(RegionError::NotFound { offset })?
            .attach(state);

        Ok(offset)
    }

    /// Zeroes, unbinds, and releases the allocation at `addr`.
    ///
    /// All three steps run even if one fails; failures are accumulated.
    pub fn dealloc(&mut self, addr: usize) -> Result<(), RegistryError> {
        let segment = self
            .segments
            .find_by_offset_mut(addr)
            .ok_or(RegionError::NotFound { offset: addr })?;
        if !segment.is_used() {
            return Err(RegionError::NotInUse { offset: addr }.into());
        }

        let mut failures: Vec<RegistryError> = Vec::new();

        if let Err(error) = self.arena.zero_range(addr, segment.size()) {
            failures.push(error.into());
        }

        match segment.detach() {
            Some(mut state) => {
                if let Err(error) = state.unbind() {
                    failures.push(error.into());
                }
            }
            None => failures.push(RegistryError::Unbound { addr }),
        }

        if let Err(error) = self.segments.deallocate(addr) {
            failures.push(error.into());
        }

        self.collect(failures)
    }

    /// Copies `len` bytes out of the allocation at `addr` if its policy
    /// admits a read. A rejected read returns no data.
    pub fn read(&mut self, addr: usize, len: usize) -> Result<Zeroizing<Vec<u8>>, RegistryError> {
        self.admit(addr, len, Access::Read)?;

        let bytes = self.arena.read(addr, len)?;
        Ok(Zeroizing::new(bytes.to_vec()))
    }

    /// Copies `data` into the allocation at `addr` if its policy admits a
    /// write.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), RegistryError> {
        self.admit(addr, data.len(), Access::Write)?;

        Ok(self.arena.write(addr, data)?)
    }

    /// Steps the segment's machine on `access` and validates it.
    ///
    /// The machine is left exactly as stepped on rejection.
    fn admit(&mut self, addr: usize, len: usize, access: Access) -> Result<(), RegistryError> {
        if len == 0 {
            return Err(RegistryError::EmptyAccess { addr });
        }

        let segment = self
            .segments
            .find_by_offset_mut(addr)
            .ok_or(RegionError::NotFound { offset: addr })?;
        if !segment.is_used() {
            return Err(RegionError::NotInUse { offset: addr }.into());
        }

        let size = segment.size();
        if len > size {
            return Err(RegistryError::LengthExceedsSegment { addr, len, size });
        }

        let state = segment
            .payload_mut()
            .filter(|state| state.is_loaded())
            .ok_or(RegistryError::Unbound { addr })?;

        state.step_access(access);

        match state.validate() {
            Verdict::Allowed => Ok(()),
            Verdict::Rejected => Err(RegistryError::PolicyViolation {
                addr,
                access,
                policy: state
                    .descriptor()
                    .map(|descriptor| descriptor.comment().to_owned())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Unbinds every machine, zeroes the arena, releases every segment,
    /// and unloads every policy.
    ///
    /// Runs to completion regardless of failures and returns them all.
    pub fn teardown(&mut self) -> Vec<RegistryError> {
        let mut failures: Vec<RegistryError> = Vec::new();

        for segment in self.segments.iter_mut().filter(|s| s.is_used()) {
            if let Some(mut state) = segment.detach() {
                if let Err(error) = state.unbind() {
                    failures.push(error.into());
                }
            }
        }

        self.arena.zeroize();
        self.segments = SegmentList::new(self.segments.arena_len());

        for (index, descriptor) in self.policies.iter().enumerate() {
            if let Err(error) = descriptor.unload() {
                warn!(pid = self.pid, policy = index, %error, "policy still referenced at teardown");
                failures.push(error.into());
            }
        }

        failures
    }

    /// Point-in-time snapshot for operators.
    pub fn view(&self) -> ProcessView {
        ProcessView {
            pid: self.pid,
            arena_size: self.arena.len(),
            used_bytes: self.used_bytes(),
            locked: self.arena.is_locked(),
            policies: self
                .policies
                .iter()
                .map(|descriptor| PolicyView {
                    regex: descriptor.comment().to_owned(),
                    ref_count: descriptor.ref_count(),
                })
                .collect(),
            segments: self
                .segments
                .iter()
                .map(|segment| {
                    let state = segment.payload();
                    SegmentView {
                        offset: segment.offset(),
                        last: segment.end() - 1,
                        size: segment.size(),
                        used: segment.is_used(),
                        policy: state
                            .and_then(AccessState::descriptor)
                            .map(|descriptor| descriptor.comment().to_owned()),
                        state: state.map(AccessState::current),
                    }
                })
                .collect(),
        }
    }

    fn collect(&self, mut failures: Vec<RegistryError>) -> Result<(), RegistryError> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(RegistryError::Cleanup {
                pid: self.pid,
                failures,
            }),
        }
    }
}

impl core::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("pid", &self.pid)
            .field("arena", &self.arena)
            .field("segments", &self.segments.len())
            .field("policies", &self.policies.len())
            .finish()
    }
}
