// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use secmem_policy::{Access, PolicyError, START_STATE};
use secmem_region::RegionError;
use secmem_test_utils::{Span, assert_coalesced, assert_partition};

use crate::context::ProcessContext;
use crate::error::{ErrorKind, RegistryError};

fn assert_invariants(context: &ProcessContext) {
    let spans: Vec<Span> = context
        .segments()
        .iter()
        .map(|s| Span {
            offset: s.offset(),
            size: s.size(),
            used: s.is_used(),
        })
        .collect();

    assert_partition(&spans, context.arena_size());
    assert_coalesced(&spans);

    for segment in context.segments().iter() {
        assert_eq!(segment.is_used(), segment.payload().is_some());
    }
}

// =============================================================================
// new()
// =============================================================================

#[test]
fn test_new_assigns_policy_ids_in_order() {
    let context = ProcessContext::new(7, 0x100, &["RW", "(R|W)*"]).expect("Failed to new(..)");

    assert_eq!(context.pid(), 7);
    assert_eq!(context.arena_size(), 0x100);
    assert_eq!(context.policies().len(), 2);
    assert_eq!(context.policies()[0].comment(), "RW");
    assert_eq!(context.policies()[1].comment(), "(R|W)*");
    assert_eq!(context.used_bytes(), 0);
    assert_invariants(&context);
}

#[test]
fn test_new_rejects_bad_policy_by_index() {
    let result = ProcessContext::new(7, 0x100, &["RW", "(", "W"]);

    assert!(matches!(
        result,
        Err(RegistryError::Compile {
            index: 1,
            source: PolicyError::UnexpectedEnd { .. },
        })
    ));
}

#[test]
fn test_new_rejects_empty_arena_and_no_policies() {
    let empty: [&str; 0] = [];

    assert!(matches!(
        ProcessContext::new(7, 0, &["RW"]),
        Err(RegistryError::EmptyArena)
    ));
    assert!(matches!(
        ProcessContext::new(7, 0x10, &empty),
        Err(RegistryError::NoPolicies)
    ));
}

// =============================================================================
// alloc() / dealloc()
// =============================================================================

#[test]
fn test_alloc_binds_machine() {
    let mut context = ProcessContext::new(7, 0x100, &["RW"]).expect("Failed to new(..)");

    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");

    assert_eq!(offset, 0);
    assert_eq!(context.policies()[0].ref_count(), 1);
    assert_eq!(context.used_bytes(), 0x10);

    let state = context
        .segments()
        .find_by_offset(offset)
        .and_then(|s| s.payload())
        .expect("Failed to find bound state");
    assert_eq!(state.current(), START_STATE);
    assert_invariants(&context);
}

#[test]
fn test_alloc_unknown_policy_mutates_nothing() {
    let mut context = ProcessContext::new(7, 0x100, &["RW"]).expect("Failed to new(..)");

    let result = context.alloc(0x10, 1);

    assert_eq!(
        result,
        Err(RegistryError::UnknownPolicy {
            policy_id: 1,
            count: 1,
        })
    );
    assert_eq!(context.segments().len(), 1);
}

#[test]
fn test_alloc_out_of_memory() {
    let mut context = ProcessContext::new(7, 0x20, &["RW"]).expect("Failed to new(..)");
    context.alloc(0x18, 0).expect("Failed to alloc(..)");

    let error = context.alloc(0x10, 0).expect_err("alloc(..) should fail");

    assert_eq!(error.kind(), ErrorKind::Capacity);
    assert_eq!(context.policies()[0].ref_count(), 1);
    assert_invariants(&context);
}

#[test]
fn test_alloc_zeroes_reused_memory() {
    let mut context = ProcessContext::new(7, 0x10, &["W(R)*"]).expect("Failed to new(..)");
    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");
    context.write(offset, &[0xFF; 0x10]).expect("Failed to write(..)");
    context.dealloc(offset).expect("Failed to dealloc(..)");

    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");
    context.write(offset, &[0xAA]).expect("Failed to write(..)");
    let bytes = context.read(offset, 0x10).expect("Failed to read(..)");

    assert_eq!(bytes[0], 0xAA);
    assert!(bytes[1..].iter().all(|&b| b == 0));
}

#[test]
fn test_dealloc_unbinds_and_coalesces() {
    let mut context = ProcessContext::new(7, 0x100, &["RW"]).expect("Failed to new(..)");
    let a = context.alloc(0x10, 0).expect("Failed to alloc(..)");
    let b = context.alloc(0x20, 0).expect("Failed to alloc(..)");
    assert_eq!(context.policies()[0].ref_count(), 2);

    context.dealloc(a).expect("Failed to dealloc(..)");
    context.dealloc(b).expect("Failed to dealloc(..)");

    assert_eq!(context.policies()[0].ref_count(), 0);
    assert_eq!(context.segments().len(), 1);
    assert_invariants(&context);
}

#[test]
fn test_dealloc_errors() {
    let mut context = ProcessContext::new(7, 0x100, &["RW"]).expect("Failed to new(..)");
    context.alloc(0x10, 0).expect("Failed to alloc(..)");

    assert_eq!(
        context.dealloc(0x08),
        Err(RegistryError::Region(RegionError::NotFound { offset: 0x08 }))
    );
    assert_eq!(
        context.dealloc(0x10),
        Err(RegistryError::Region(RegionError::NotInUse { offset: 0x10 }))
    );
    assert_eq!(context.policies()[0].ref_count(), 1);
}

#[test]
fn test_dealloc_zeroes_memory() {
    let mut context = ProcessContext::new(7, 0x20, &["(R|W)*"]).expect("Failed to new(..)");
    let offset = context.alloc(0x20, 0).expect("Failed to alloc(..)");
    context.write(offset, &[0x5A; 0x20]).expect("Failed to write(..)");

    context.dealloc(offset).expect("Failed to dealloc(..)");

    assert_eq!(context.view().used_bytes, 0);
    let offset = context.alloc(0x20, 0).expect("Failed to alloc(..)");
    let bytes = context.read(offset, 0x20).expect("Failed to read(..)");
    assert!(bytes.iter().all(|&b| b == 0));
}

// =============================================================================
// read() / write()
// =============================================================================

#[test]
fn test_rw_policy_sequence() {
    let mut context = ProcessContext::new(7, 0x100, &["RW"]).expect("Failed to new(..)");
    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");

    let bytes = context.read(offset, 4).expect("Failed to read(..)");
    assert_eq!(bytes.as_slice(), &[0, 0, 0, 0]);

    context.write(offset, &[1, 2, 3, 4]).expect("Failed to write(..)");

    let error = context.read(offset, 4).expect_err("read(..) should be rejected");
    assert_eq!(
        error,
        RegistryError::PolicyViolation {
            addr: offset,
            access: Access::Read,
            policy: "RW".to_owned(),
        }
    );

    // Rejection is terminal.
    let error = context.write(offset, &[9]).expect_err("write(..) should be rejected");
    assert_eq!(error.kind(), ErrorKind::PolicyViolation);
}

#[test]
fn test_rejected_write_moves_no_bytes() {
    let mut context = ProcessContext::new(7, 0x10, &["R*"]).expect("Failed to new(..)");
    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");

    let result = context.write(offset, &[0xFF; 4]);

    assert_eq!(result.map_err(|e| e.kind()), Err(ErrorKind::PolicyViolation));

    let mut context = ProcessContext::new(8, 0x10, &["W"]).expect("Failed to new(..)");
    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");
    context.write(offset, &[0x11; 4]).expect("Failed to write(..)");

    let result = context.read(offset, 4);

    assert!(matches!(result, Err(RegistryError::PolicyViolation { .. })));
}

#[test]
fn test_access_length_checks() {
    let mut context = ProcessContext::new(7, 0x100, &["(R|W)*"]).expect("Failed to new(..)");
    let offset = context.alloc(0x10, 0).expect("Failed to alloc(..)");

    assert_eq!(
        context.read(offset, 0x11).map(|_| ()),
        Err(RegistryError::LengthExceedsSegment {
            addr: offset,
            len: 0x11,
            size: 0x10,
        })
    );
    assert_eq!(
        context.write(offset, &[]),
        Err(RegistryError::EmptyAccess { addr: offset })
    );

    // Neither failure stepped the machine.
    let state = context
        .segments()
        .find_by_offset(offset)
        .and_then(|s| s.payload())
        .expect("Failed to find bound state");
    assert_eq!(state.current(), START_STATE);
}

#[test]
fn test_access_free_or_missing_segment() {
    let mut context = ProcessContext::new(7, 0x100, &["(R|W)*"]).expect("Failed to new(..)");
    context.alloc(0x10, 0).expect("Failed to alloc(..)");

    assert_eq!(
        context.read(0x10, 1).map(|_| ()),
        Err(RegistryError::Region(RegionError::NotInUse { offset: 0x10 }))
    );
    assert_eq!(
        context.write(0x04, &[1]),
        Err(RegistryError::Region(RegionError::NotFound { offset: 0x04 }))
    );
}

// =============================================================================
// teardown()
// =============================================================================

#[test]
fn test_teardown_releases_everything() {
    let mut context = ProcessContext::new(7, 0x100, &["RW", "(R|W)*"]).expect("Failed to new(..)");
    context.alloc(0x10, 0).expect("Failed to alloc(..)");
    let offset = context.alloc(0x10, 1).expect("Failed to alloc(..)");
    context.write(offset, b"data").expect("Failed to write(..)");

    let failures = context.teardown();

    assert!(failures.is_empty());
    assert!(context.policies().iter().all(|d| d.is_unloaded()));
    assert!(context.policies().iter().all(|d| d.ref_count() == 0));
}

#[test]
fn test_teardown_leaves_single_free_segment() {
    let mut context = ProcessContext::new(7, 0x100, &["(R|W)*"]).expect("Failed to new(..)");
    let first = context.alloc(0x10, 0).expect("Failed to alloc(..)");
    context.alloc(0x20, 0).expect("Failed to alloc(..)");
    context.write(first, b"data").expect("Failed to write(..)");

    let failures = context.teardown();

    assert!(failures.is_empty());
    assert_eq!(context.segments().len(), 1);
    assert_eq!(context.segments().used_count(), 0);
    assert_eq!(context.segments().largest_free(), 0x100);
    assert_eq!(context.used_bytes(), 0);
    assert_invariants(&context);

    // A late operation on a torn-down context fails cleanly.
    let error = context.read(first, 4).expect_err("read(..) should fail");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}
