// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

#[cfg(unix)]
#[test]
#[serial_test::serial(signal)]
fn test_sigterm_raises_stop_flag() {
    use std::sync::atomic::Ordering;

    use crate::signal::{install, reset, stop_flag};

    reset();
    install().expect("Failed to install()");

    // SAFETY: the handler just installed only stores to an atomic.
    let rc = unsafe { libc::raise(libc::SIGTERM) };

    assert_eq!(rc, 0);
    assert!(stop_flag().load(Ordering::Acquire));
    reset();
}
