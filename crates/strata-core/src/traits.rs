//! Collaborator traits: the write barrier and the external pointer table.
//!
//! Both are injected into the heap rather than called as globals, so the
//! array layer can run against a mock collector in tests.

use crate::error::ArrayError;
use crate::id::{ObjectRef, PointerHandle, PointerTag, SlotAddress};
use crate::tagged::Tagged;

/// Collector notification hook for reference stores.
///
/// Invoked for every heap reference stored into a reference-bearing slot
/// unless the store uses [`BarrierMode::Skip`](crate::BarrierMode::Skip).
/// Implementations are called from the mutator thread on the store path
/// and must not allocate in the heap they observe.
pub trait WriteBarrier: Send + Sync {
    /// `value` was just stored into `slot`, a slot of `host`.
    fn record_write(&self, host: ObjectRef, slot: SlotAddress, value: Tagged);
}

/// A barrier that ignores every notification.
///
/// Suitable when no collector is running concurrently, e.g. in benchmarks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBarrier;

impl WriteBarrier for NoBarrier {
    fn record_write(&self, _host: ObjectRef, _slot: SlotAddress, _value: Tagged) {}
}

/// Out-of-line table of raw addresses, referenced from the heap by index.
///
/// Keeping raw addresses out of scannable heap memory is an isolation
/// boundary: heap corruption can at worst swap one table index for another
/// of the same tag, never forge an arbitrary pointer.
pub trait ExternalPointerTable: Send + Sync {
    /// Allocate a new entry holding `address` under `tag`.
    fn allocate(&self, address: u64, tag: PointerTag) -> Result<PointerHandle, ArrayError>;

    /// Read the address stored under `handle`, checking `tag`.
    fn get(&self, handle: PointerHandle, tag: PointerTag) -> Result<u64, ArrayError>;

    /// Overwrite the address stored under `handle`, checking `tag`.
    fn set(&self, handle: PointerHandle, address: u64, tag: PointerTag) -> Result<(), ArrayError>;

    /// Return the entry to the table. The handle must not be used again.
    fn free(&self, handle: PointerHandle);
}
