// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::HardeningStatus;

#[test]
fn test_status_bits_round_trip() {
    for bits in 0..8u8 {
        assert_eq!(HardeningStatus::from_bits(bits).to_bits(), bits);
    }
}

#[test]
fn test_is_protected() {
    let none = HardeningStatus::from_bits(0);
    let locked_only = HardeningStatus::from_bits(4);
    let rlimit_only = HardeningStatus::from_bits(2);

    assert!(!none.is_protected());
    assert!(!locked_only.is_protected());
    assert!(rlimit_only.is_protected());
}

#[cfg(target_os = "linux")]
mod linux {
    use serial_test::serial;

    use crate::{HardeningOptions, HardeningStatus, harden, hardening_status};

    fn reset_state() {
        use core::sync::atomic::Ordering;
        crate::INIT_STATE.store(crate::STATE_UNINIT, Ordering::SeqCst);
        crate::STATUS_BITS.store(0, Ordering::SeqCst);
    }

    /// Runs an ignored test as a subprocess and returns its exit code.
    fn run_test_as_subprocess(test_name: &str) -> Option<i32> {
        let exe = std::env::current_exe().expect("Failed to get current exe");
        let status = std::process::Command::new(exe)
            .args([
                "--exact",
                test_name,
                "--ignored",
                "--test-threads=1",
                "--nocapture",
            ])
            .status()
            .expect("Failed to run subprocess");
        status.code()
    }

    #[test]
    #[ignore]
    fn subprocess_test_harden_disables_dumps() {
        reset_state();
        assert_eq!(hardening_status(), None);

        let status = harden(HardeningOptions::default());

        assert!(status.dumpable_disabled, "prctl should have succeeded");
        assert!(status.core_limit_zero, "rlimit should have succeeded");
        assert!(!status.memory_locked, "mlockall was not requested");
        // SAFETY: PR_GET_DUMPABLE takes integer arguments only.
        assert_eq!(unsafe { libc::prctl(libc::PR_GET_DUMPABLE, 0, 0, 0, 0) }, 0);

        std::process::exit(0);
    }

    #[test]
    #[serial(harden)]
    fn test_harden_disables_dumps() {
        let exit_code =
            run_test_as_subprocess("tests::linux::subprocess_test_harden_disables_dumps");
        assert_eq!(exit_code, Some(0), "Subprocess should exit with 0");
    }

    #[test]
    #[ignore]
    fn subprocess_test_first_options_win() {
        reset_state();

        let first = harden(HardeningOptions::default());
        let second = harden(HardeningOptions {
            lock_all_memory: true,
        });

        assert_eq!(first, second);
        assert!(!second.memory_locked);

        std::process::exit(0);
    }

    #[test]
    #[serial(harden)]
    fn test_first_options_win() {
        let exit_code = run_test_as_subprocess("tests::linux::subprocess_test_first_options_win");
        assert_eq!(exit_code, Some(0), "Subprocess should exit with 0");
    }

    #[test]
    #[ignore]
    fn subprocess_test_concurrent_harden() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        reset_state();

        let barrier = Arc::new(Barrier::new(32));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    harden(HardeningOptions::default())
                })
            })
            .collect();

        let results: Vec<HardeningStatus> = handles
            .into_iter()
            .map(|h| h.join().expect("Failed to join()"))
            .collect();

        assert!(results.iter().all(|r| r == &results[0]));
        assert!(results[0].is_protected());

        std::process::exit(0);
    }

    #[test]
    #[serial(harden)]
    fn test_concurrent_harden() {
        let exit_code = run_test_as_subprocess("tests::linux::subprocess_test_concurrent_harden");
        assert_eq!(exit_code, Some(0), "Subprocess should exit with 0");
    }
}

#[cfg(not(target_os = "linux"))]
mod non_linux {
    use crate::{HardeningOptions, harden};

    #[test]
    fn test_harden_reports_nothing() {
        let status = harden(HardeningOptions {
            lock_all_memory: true,
        });

        assert!(!status.is_protected());
        assert!(!status.memory_locked);
    }
}
