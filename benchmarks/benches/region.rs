// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use secmem_region::{Arena, SegmentList};

fn is_fast_mode() -> bool {
    std::env::var("FAST_BENCH")
        .map(|v| v == "1")
        .unwrap_or(false)
}

fn configure_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    if is_fast_mode() {
        group.measurement_time(std::time::Duration::from_millis(500));
        group.sample_size(10);
    } else {
        group.measurement_time(std::time::Duration::from_secs(3));
        group.sample_size(50);
    }
}

// =============================================================================
// SegmentList
// =============================================================================

fn bench_fill_and_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("segments_fill_release");
    configure_group(&mut group);

    for count in [16usize, 128, 1024] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            b.iter(|| {
                let mut list: SegmentList<()> = SegmentList::new(n * 0x10);
                let offsets: Vec<usize> = (0..n).filter_map(|_| list.allocate(0x10).ok()).collect();
                // Every other segment first, forcing two-sided merges later.
                for offset in offsets.iter().step_by(2).chain(offsets.iter().skip(1).step_by(2)) {
                    let _ = list.deallocate(*offset);
                }
                black_box(list.len())
            })
        });
    }

    group.finish();
}

// =============================================================================
// Arena
// =============================================================================

fn bench_arena_zeroize(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_zero_range");
    configure_group(&mut group);

    for size in [0x100usize, 0x1000, 0x10000] {
        group.throughput(Throughput::Bytes(size as u64));
        let mut arena = Arena::new(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| black_box(arena.zero_range(0, n)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fill_and_release, bench_arena_zeroize);
criterion_main!(benches);
