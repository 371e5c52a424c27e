//! Criterion micro-benchmarks for array allocation, access, growth, and
//! weak list maintenance.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_bench::{bench_heap, clear_random_slots, populate_weak_list};
use strata_core::{AccessOrder, AllocationType, BarrierMode, Tagged};
use strata_heap::{ArrayList, ByteArray, FixedArray, FixedDoubleArray};

/// Benchmark: allocate 1K fixed arrays of 16 slots each.
fn bench_fixed_array_alloc(c: &mut Criterion) {
    c.bench_function("fixed_array_alloc_1k", |b| {
        b.iter(|| {
            let heap = bench_heap();
            for _ in 0..1000 {
                black_box(FixedArray::new(&heap, 16, AllocationType::Young).unwrap());
            }
        });
    });
}

/// Benchmark: 10K relaxed Smi stores and loads on one array.
fn bench_fixed_array_access(c: &mut Criterion) {
    let heap = bench_heap();
    let array = FixedArray::new(&heap, 10_000, AllocationType::Old).unwrap();
    c.bench_function("fixed_array_set_get_10k", |b| {
        b.iter(|| {
            for i in 0..array.capacity() {
                array.set(i, Tagged::smi(i as i64), AccessOrder::Relaxed, BarrierMode::Skip);
            }
            let sum: i64 = array.iter().filter_map(Tagged::to_smi).sum();
            black_box(sum);
        });
    });
}

/// Benchmark: grow an array list from capacity 1 to 10K entries.
fn bench_array_list_add(c: &mut Criterion) {
    c.bench_function("array_list_add_10k", |b| {
        b.iter(|| {
            let heap = bench_heap();
            let mut list = ArrayList::new(&heap, 1, AllocationType::Young).unwrap();
            for i in 0..10_000 {
                list.add(Tagged::smi(i)).unwrap();
            }
            black_box(list.length());
        });
    });
}

/// Benchmark: clear a third of a 10K weak list, then compact it.
fn bench_weak_list_compact(c: &mut Criterion) {
    let mut seed = 0u64;
    c.bench_function("weak_list_clear_compact_10k", |b| {
        b.iter(|| {
            let heap = bench_heap();
            let (list, _) = populate_weak_list(&heap, 10_000).unwrap();
            seed += 1;
            clear_random_slots(&heap, &list, 0.33, seed);
            list.compact();
            black_box(list.length());
        });
    });
}

/// Benchmark: shrink a 4K-slot array in 64-slot steps.
fn bench_right_trim(c: &mut Criterion) {
    c.bench_function("fixed_array_right_trim_4k", |b| {
        b.iter(|| {
            let heap = bench_heap();
            let array = FixedArray::new(&heap, 4096, AllocationType::Young).unwrap();
            for cap in (64..4096).rev().step_by(64) {
                array.right_trim(cap);
            }
            black_box(array.capacity());
        });
    });
}

/// Benchmark: bulk byte copies in and out of a 64KB byte array.
fn bench_byte_array_copy(c: &mut Criterion) {
    let heap = bench_heap();
    let bytes = ByteArray::new(&heap, 64 * 1024, AllocationType::Old).unwrap();
    let data: Vec<u8> = (0..bytes.length()).map(|i| i as u8).collect();
    let mut out = vec![0u8; data.len()];
    c.bench_function("byte_array_copy_64k", |b| {
        b.iter(|| {
            bytes.copy_in_bytes(0, &data).unwrap();
            bytes.copy_out_bytes(0, &mut out).unwrap();
            black_box(out[out.len() - 1]);
        });
    });
}

/// Benchmark: fill a 10K double array with holes, then overwrite it.
fn bench_double_array(c: &mut Criterion) {
    let heap = bench_heap();
    let doubles = FixedDoubleArray::new(&heap, 10_000, AllocationType::Old).unwrap();
    c.bench_function("double_array_holes_10k", |b| {
        b.iter(|| {
            doubles.fill_with_holes(0, doubles.length());
            for i in 0..doubles.length() {
                doubles.set(i, i as f64 * 0.5);
            }
            black_box(doubles.get(doubles.length() - 1));
        });
    });
}

criterion_group!(
    benches,
    bench_fixed_array_alloc,
    bench_fixed_array_access,
    bench_array_list_add,
    bench_weak_list_compact,
    bench_right_trim,
    bench_byte_array_copy,
    bench_double_array
);
criterion_main!(benches);
