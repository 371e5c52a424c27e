//! Benchmark workloads for the Strata heap array layer.
//!
//! Provides deterministic heap populations for benchmarks and stress tests:
//!
//! - [`bench_heap`]: a default-sized heap with zapping off
//! - [`populate_weak_list`]: a weak list holding `n` distinct referents
//! - [`clear_random_slots`]: seeded clearing of a fraction of weak slots

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use strata_core::{AllocationType, ArrayError, ObjectRef, Tagged};
use strata_heap::{FixedArray, Heap, HeapConfig, WeakArrayList};

/// A heap with default segment sizing and no zapping, so trim cost is
/// measured without the debug fill.
pub fn bench_heap() -> Heap {
    let config = HeapConfig {
        zap_freed_memory: false,
        ..HeapConfig::new()
    };
    // The default config always validates.
    Heap::new(config).unwrap_or_else(|e| panic!("default bench heap: {e}"))
}

/// Allocate `n` one-slot referents and a weak list referring to each.
pub fn populate_weak_list(
    heap: &Heap,
    n: usize,
) -> Result<(WeakArrayList<'_>, Vec<ObjectRef>), ArrayError> {
    let mut list = WeakArrayList::new(heap, n.max(1), AllocationType::Old)?;
    let mut targets = Vec::with_capacity(n);
    for _ in 0..n {
        let target = FixedArray::new(heap, 1, AllocationType::Young)?.object();
        list.add_to_end(Tagged::weak(target))?;
        targets.push(target);
    }
    Ok((list, targets))
}

/// Clear each weak slot of `list` with probability `fraction`, using a
/// ChaCha8 stream seeded from `seed`. Returns the number of slots cleared.
pub fn clear_random_slots(heap: &Heap, list: &WeakArrayList<'_>, fraction: f64, seed: u64) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cleared = 0;
    for index in 0..list.length() {
        if rng.random_bool(fraction) && list.slot_state(index).is_live() {
            heap.clear_weak_slot(list.slot_address(index));
            cleared += 1;
        }
    }
    cleared
}
