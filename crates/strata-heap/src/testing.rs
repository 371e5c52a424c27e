//! Shared fixtures for unit tests in this crate.

use std::sync::{Arc, Mutex};

use strata_core::{AllocationType, ObjectRef, SlotAddress, Tagged, WriteBarrier};

use crate::config::HeapConfig;
use crate::fixed_array::FixedArray;
use crate::heap::Heap;
use crate::pointer_table::PointerTable;

type Write = (ObjectRef, SlotAddress, Tagged);

/// Barrier that keeps every notification.
#[derive(Default)]
pub(crate) struct LogBarrier {
    writes: Mutex<Vec<Write>>,
}

impl LogBarrier {
    pub(crate) fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl WriteBarrier for LogBarrier {
    fn record_write(&self, host: ObjectRef, slot: SlotAddress, value: Tagged) {
        self.writes.lock().unwrap().push((host, slot, value));
    }
}

pub(crate) fn test_heap() -> Heap {
    Heap::new(HeapConfig::small()).unwrap()
}

pub(crate) fn recording_heap() -> (Heap, Arc<LogBarrier>) {
    let barrier = Arc::new(LogBarrier::default());
    let config = HeapConfig::small();
    let table = Arc::new(PointerTable::new(config.pointer_table_capacity));
    let heap = Heap::with_collaborators(config, barrier.clone(), table).unwrap();
    (heap, barrier)
}

/// `n` distinct small objects to use as reference targets.
pub(crate) fn referents(heap: &Heap, n: usize) -> Vec<ObjectRef> {
    (0..n)
        .map(|_| {
            FixedArray::allocate(heap, 1, AllocationType::Young)
                .unwrap()
                .object()
        })
        .collect()
}
