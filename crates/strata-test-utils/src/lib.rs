//! Test utilities and mock collaborators for Strata development.
//!
//! Provides mock implementations of the collaborator traits
//! ([`WriteBarrier`], [`ExternalPointerTable`]) that record what the array
//! layer asks of them, plus heap fixtures and a [`SimulatedCollector`] in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{recording_heap, referents, test_heap, SimulatedCollector};

use std::collections::HashMap;
use std::sync::Mutex;

use strata_core::{
    ArrayError, ExternalPointerTable, ObjectRef, PointerHandle, PointerTag, SlotAddress, Tagged,
    WriteBarrier,
};

/// One write barrier notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedWrite {
    pub host: ObjectRef,
    pub slot: SlotAddress,
    pub value: Tagged,
}

/// Mock implementation of [`WriteBarrier`].
///
/// Keeps every notification in arrival order. Inspect with
/// [`writes`](RecordingBarrier::writes) and reset between phases with
/// [`clear`](RecordingBarrier::clear).
#[derive(Default)]
pub struct RecordingBarrier {
    writes: Mutex<Vec<RecordedWrite>>,
}

impl RecordingBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Notifications whose host is `host`.
    pub fn writes_to(&self, host: ObjectRef) -> Vec<RecordedWrite> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.host == host)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl WriteBarrier for RecordingBarrier {
    fn record_write(&self, host: ObjectRef, slot: SlotAddress, value: Tagged) {
        self.writes
            .lock()
            .unwrap()
            .push(RecordedWrite { host, slot, value });
    }
}

#[derive(Default)]
struct TableState {
    entries: HashMap<u32, (u64, PointerTag)>,
    next: u32,
    allocations: usize,
    frees: usize,
}

/// Mock implementation of [`ExternalPointerTable`].
///
/// Backed by a `HashMap<u32, (address, tag)>`. Counts allocations and
/// frees so tests can check that lazily-populated slots allocate exactly
/// once. An optional capacity makes the table report
/// [`ArrayError::PointerTableFull`].
pub struct MockPointerTable {
    state: Mutex<TableState>,
    capacity: Option<usize>,
}

impl MockPointerTable {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState::default()),
            capacity: None,
        }
    }

    /// A table that refuses to hold more than `capacity` live entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(TableState::default()),
            capacity: Some(capacity),
        }
    }

    pub fn allocations(&self) -> usize {
        self.state.lock().unwrap().allocations
    }

    pub fn frees(&self) -> usize {
        self.state.lock().unwrap().frees
    }

    /// Number of entries allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// The raw entry behind `handle`, bypassing tag checks.
    pub fn entry(&self, handle: PointerHandle) -> Option<(u64, PointerTag)> {
        self.state.lock().unwrap().entries.get(&handle.0).copied()
    }
}

impl Default for MockPointerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalPointerTable for MockPointerTable {
    fn allocate(&self, address: u64, tag: PointerTag) -> Result<PointerHandle, ArrayError> {
        let mut state = self.state.lock().unwrap();
        if let Some(capacity) = self.capacity {
            if state.entries.len() >= capacity {
                return Err(ArrayError::PointerTableFull { capacity });
            }
        }
        state.next += 1;
        let index = state.next;
        state.entries.insert(index, (address, tag));
        state.allocations += 1;
        Ok(PointerHandle(index))
    }

    fn get(&self, handle: PointerHandle, tag: PointerTag) -> Result<u64, ArrayError> {
        let state = self.state.lock().unwrap();
        match state.entries.get(&handle.0) {
            None => Err(ArrayError::InvalidHandle { handle }),
            Some(&(_, found)) if found != tag => Err(ArrayError::TagMismatch {
                expected: tag,
                found,
            }),
            Some(&(address, _)) => Ok(address),
        }
    }

    fn set(&self, handle: PointerHandle, address: u64, tag: PointerTag) -> Result<(), ArrayError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .get_mut(&handle.0)
            .ok_or(ArrayError::InvalidHandle { handle })?;
        if entry.1 != tag {
            return Err(ArrayError::TagMismatch {
                expected: tag,
                found: entry.1,
            });
        }
        entry.0 = address;
        Ok(())
    }

    fn free(&self, handle: PointerHandle) {
        let mut state = self.state.lock().unwrap();
        if state.entries.remove(&handle.0).is_some() {
            state.frees += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_table_counts_and_checks_tags() {
        let table = MockPointerTable::new();
        let h = table.allocate(0x10, PointerTag(3)).unwrap();
        assert_eq!(table.get(h, PointerTag(3)), Ok(0x10));
        assert!(matches!(
            table.set(h, 0x20, PointerTag(4)),
            Err(ArrayError::TagMismatch { .. })
        ));
        table.set(h, 0x20, PointerTag(3)).unwrap();
        assert_eq!(table.entry(h), Some((0x20, PointerTag(3))));
        table.free(h);
        table.free(h);
        assert_eq!((table.allocations(), table.frees(), table.live()), (1, 1, 0));
        assert_eq!(
            table.get(h, PointerTag(3)),
            Err(ArrayError::InvalidHandle { handle: h })
        );
    }

    #[test]
    fn mock_table_capacity() {
        let table = MockPointerTable::with_capacity(1);
        let h = table.allocate(1, PointerTag(1)).unwrap();
        assert_eq!(
            table.allocate(2, PointerTag(1)),
            Err(ArrayError::PointerTableFull { capacity: 1 })
        );
        table.free(h);
        assert!(table.allocate(3, PointerTag(1)).is_ok());
    }
}
