//! Reusable heap fixtures.
//!
//! - [`test_heap`] / [`recording_heap`] build small heaps for tests.
//! - [`referents`] allocates distinct objects to use as reference targets.
//! - [`SimulatedCollector`] plays the collector's part for weak references:
//!   objects marked dead have every weak slot naming them cleared.

use std::collections::HashSet;
use std::sync::Arc;

use strata_core::{AllocationType, ObjectRef, SlotAddress};
use strata_heap::{FixedArray, Heap, HeapConfig, PointerTable, SlotKind};

use crate::RecordingBarrier;

/// A heap built from [`HeapConfig::small`] with the default collaborators.
pub fn test_heap() -> Heap {
    Heap::new(HeapConfig::small()).unwrap()
}

/// A small heap whose write barrier records every notification.
pub fn recording_heap() -> (Heap, Arc<RecordingBarrier>) {
    let config = HeapConfig::small();
    let barrier = Arc::new(RecordingBarrier::new());
    let table = Arc::new(PointerTable::new(config.pointer_table_capacity));
    let heap = Heap::with_collaborators(config, barrier.clone(), table).unwrap();
    (heap, barrier)
}

/// `n` distinct one-slot young arrays.
pub fn referents(heap: &Heap, n: usize) -> Vec<ObjectRef> {
    (0..n)
        .map(|_| FixedArray::new(heap, 1, AllocationType::Young).unwrap().object())
        .collect()
}

/// Stand-in for the collector's weak processing phase.
///
/// Tests mark objects dead, then call [`collect`](Self::collect) to clear
/// every weak slot that refers to one. Strong references to dead objects
/// are left alone; a real collector would never declare those dead.
#[derive(Default)]
pub struct SimulatedCollector {
    dead: HashSet<ObjectRef>,
}

impl SimulatedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `object` unreachable.
    pub fn mark_dead(&mut self, object: ObjectRef) {
        self.dead.insert(object);
    }

    pub fn is_dead(&self, object: ObjectRef) -> bool {
        self.dead.contains(&object)
    }

    /// Clear weak slots naming dead objects. Returns the number cleared,
    /// or the address of an unparseable header.
    pub fn collect(&self, heap: &Heap) -> Result<usize, ObjectRef> {
        let mut doomed: Vec<SlotAddress> = Vec::new();
        heap.visit_pointers(|_, slot, kind, value| {
            if kind != SlotKind::MaybeWeak || !value.is_weak() {
                return;
            }
            if value.to_object().is_some_and(|o| self.dead.contains(&o)) {
                doomed.push(slot);
            }
        })?;
        for &slot in &doomed {
            heap.clear_weak_slot(slot);
        }
        Ok(doomed.len())
    }
}
