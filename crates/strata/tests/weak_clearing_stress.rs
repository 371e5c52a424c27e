//! Stress test: seeded random churn on a weak array list.
//!
//! A ChaCha8 stream drives a mix of insertions, collector clearing,
//! compaction, and removal against a model multiset of live referents.
//! After every step the list must hold exactly the model's referents, and
//! the heap must verify cleanly at checkpoints.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use strata::prelude::*;
use strata_test_utils::{referents, SimulatedCollector};

fn sorted(mut refs: Vec<ObjectRef>) -> Vec<ObjectRef> {
    refs.sort();
    refs
}

fn run_churn(seed: u64, steps: usize) {
    let heap = Heap::new(HeapConfig {
        max_segments: 512,
        ..HeapConfig::small()
    })
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut gc = SimulatedCollector::new();
    let mut list = WeakArrayList::new(&heap, 4, AllocationType::Old).unwrap();
    let mut live: Vec<ObjectRef> = Vec::new();

    for step in 0..steps {
        match rng.random_range(0..100) {
            0..=24 => {
                let target = referents(&heap, 1)[0];
                list.add_to_end(Tagged::weak(target)).unwrap();
                live.push(target);
            }
            25..=44 => {
                let target = referents(&heap, 1)[0];
                list.append(Tagged::weak(target)).unwrap();
                live.push(target);
            }
            45..=69 if !live.is_empty() => {
                let victim = live.swap_remove(rng.random_range(0..live.len()));
                gc.mark_dead(victim);
                // Abandoned backing stores may also name the victim.
                let cleared = gc.collect(&heap).unwrap();
                assert!(cleared >= 1, "step {step}");
            }
            70..=84 => list.compact(),
            85..=99 if !live.is_empty() => {
                let target = live.swap_remove(rng.random_range(0..live.len()));
                assert!(list.remove_one(Tagged::weak(target)), "step {step}");
            }
            _ => {}
        }

        assert_eq!(list.count_live_weak_references(), live.len(), "step {step}");
        assert_eq!(
            sorted(list.objects().collect()),
            sorted(live.clone()),
            "step {step}"
        );
        assert!(list.length() <= list.capacity());
        if step % 100 == 0 {
            assert_eq!(heap.verify(), Ok(()), "step {step}");
        }
    }

    list.compact();
    assert_eq!(list.length(), live.len());
    assert_eq!(heap.verify(), Ok(()));
}

#[test]
fn churn_seed_1() {
    run_churn(1, 1_000);
}

#[test]
fn churn_seed_42() {
    run_churn(42, 1_000);
}

#[test]
fn churn_many_short_runs() {
    for seed in 100..120 {
        run_churn(seed, 150);
    }
}
