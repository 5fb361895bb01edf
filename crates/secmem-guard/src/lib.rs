// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! secmem_guard - One-shot process hardening via prctl, setrlimit, and mlockall
//!
//! The daemon holds every client's secrets in its own address space, so it
//! refuses core dumps and ptrace attachment (`PR_SET_DUMPABLE = 0`), caps
//! core size at zero (`RLIMIT_CORE`), and can pin all of its pages in RAM.
//!
//! Hardening runs at most once per process. The first caller's options win;
//! later calls return the cached result without side effects.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(test)]
mod tests;

use core::sync::atomic::{AtomicU8, Ordering};

/// What to attempt beyond the always-on core dump protections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardeningOptions {
    /// Lock current and future pages with `mlockall`.
    pub lock_all_memory: bool,
}

/// Outcome of each protection. Every step is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardeningStatus {
    /// `prctl(PR_SET_DUMPABLE, 0)` succeeded: no core dumps, no ptrace
    /// attach by unprivileged peers.
    pub dumpable_disabled: bool,

    /// `setrlimit(RLIMIT_CORE, 0)` succeeded.
    pub core_limit_zero: bool,

    /// `mlockall(MCL_CURRENT | MCL_FUTURE)` succeeded. Always false when
    /// not requested.
    pub memory_locked: bool,
}

impl HardeningStatus {
    /// At least one core dump protection is active.
    pub fn is_protected(&self) -> bool {
        self.dumpable_disabled || self.core_limit_zero
    }

    fn to_bits(self) -> u8 {
        u8::from(self.dumpable_disabled)
            | u8::from(self.core_limit_zero) << 1
            | u8::from(self.memory_locked) << 2
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            dumpable_disabled: bits & 1 != 0,
            core_limit_zero: bits & 2 != 0,
            memory_locked: bits & 4 != 0,
        }
    }
}

const STATE_UNINIT: u8 = 0;
const STATE_IN_PROGRESS: u8 = 1;
const STATE_DONE: u8 = 2;

static INIT_STATE: AtomicU8 = AtomicU8::new(STATE_UNINIT);
static STATUS_BITS: AtomicU8 = AtomicU8::new(0);

/// Hardens the process on first call and returns the outcome.
///
/// Thread-safe: concurrent first callers spin until the winner finishes.
///
/// # Example
///
/// ```
/// use secmem_guard::{HardeningOptions, harden};
///
/// let status = harden(HardeningOptions::default());
/// if !status.is_protected() {
///     eprintln!("core dumps remain possible");
/// }
/// assert!(!status.memory_locked);
/// ```
pub fn harden(options: HardeningOptions) -> HardeningStatus {
    loop {
        if let Some(status) = hardening_status() {
            return status;
        }
        init_slow(options);
    }
}

/// The cached outcome, or `None` if [`harden`] has not completed yet.
pub fn hardening_status() -> Option<HardeningStatus> {
    (INIT_STATE.load(Ordering::Acquire) == STATE_DONE)
        .then(|| HardeningStatus::from_bits(STATUS_BITS.load(Ordering::Relaxed)))
}

#[cold]
#[inline(never)]
fn init_slow(options: HardeningOptions) {
    match INIT_STATE.compare_exchange(
        STATE_UNINIT,
        STATE_IN_PROGRESS,
        Ordering::Acquire,
        Ordering::Relaxed,
    ) {
        Ok(_) => {
            let status = HardeningStatus {
                dumpable_disabled: prctl_set_not_dumpable(),
                core_limit_zero: setrlimit_core_zero(),
                memory_locked: options.lock_all_memory && mlock_all(),
            };
            STATUS_BITS.store(status.to_bits(), Ordering::Relaxed);

            // Lets racing threads reach the spin loop under test.
            #[cfg(test)]
            std::thread::sleep(std::time::Duration::from_millis(50));
            INIT_STATE.store(STATE_DONE, Ordering::Release);
        }
        Err(_) => {
            while INIT_STATE.load(Ordering::Acquire) != STATE_DONE {
                core::hint::spin_loop();
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn prctl_set_not_dumpable() -> bool {
    // SAFETY: PR_SET_DUMPABLE takes integer arguments only.
    unsafe { libc::prctl(libc::PR_SET_DUMPABLE, 0, 0, 0, 0) == 0 }
}

#[cfg(not(target_os = "linux"))]
fn prctl_set_not_dumpable() -> bool {
    false
}

#[cfg(target_os = "linux")]
fn setrlimit_core_zero() -> bool {
    let limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: limit outlives the call.
    unsafe { libc::setrlimit(libc::RLIMIT_CORE, &limit) == 0 }
}

#[cfg(not(target_os = "linux"))]
fn setrlimit_core_zero() -> bool {
    false
}

#[cfg(target_os = "linux")]
fn mlock_all() -> bool {
    // SAFETY: mlockall takes flags only.
    unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) == 0 }
}

#[cfg(not(target_os = "linux"))]
fn mlock_all() -> bool {
    false
}
