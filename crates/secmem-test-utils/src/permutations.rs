// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Permutation drivers for order-sensitive tests.

/// Heap's algorithm, visiting every ordering of `indices[..k]` in place.
fn heap_permute<F>(indices: &mut [usize], k: usize, visit: &mut F)
where
    F: FnMut(&[usize]),
{
    if k <= 1 {
        visit(indices);
        return;
    }

    for i in 0..k - 1 {
        heap_permute(indices, k - 1, visit);
        let swap_with = if k % 2 == 0 { i } else { 0 };
        indices.swap(swap_with, k - 1);
    }

    heap_permute(indices, k - 1, visit);
}

/// Calls `visit` once with every permutation of `0..len`.
///
/// # Example
/// ```
/// use secmem_test_utils::index_permutations;
///
/// let mut seen = Vec::new();
/// index_permutations(3, |order| seen.push(order.to_vec()));
///
/// assert_eq!(seen.len(), 6);
/// seen.sort();
/// seen.dedup();
/// assert_eq!(seen.len(), 6);
/// ```
pub fn index_permutations<F>(len: usize, mut visit: F)
where
    F: FnMut(&[usize]),
{
    if len == 0 {
        return;
    }

    let mut indices: Vec<usize> = (0..len).collect();
    heap_permute(&mut indices, len, &mut visit);
}
