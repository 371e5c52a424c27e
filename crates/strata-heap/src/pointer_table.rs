//! Fixed-capacity external pointer table.
//!
//! Entries are `AtomicU64` words packing `address | tag << 48`. Entry 0 is
//! the null handle and is never allocated. Allocation bumps a cursor; a
//! freed entry has its tag reset to [`PointerTag::FREE`] and is not reused,
//! so a stale handle reads as invalid rather than aliasing a newer entry.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use strata_core::{ArrayError, ExternalPointerTable, PointerHandle, PointerTag};
use tracing::warn;

const TAG_SHIFT: u32 = 48;
const ADDRESS_MASK: u64 = (1 << TAG_SHIFT) - 1;

/// Largest address a table entry can hold.
pub const MAX_EXTERNAL_ADDRESS: u64 = ADDRESS_MASK;

fn pack(address: u64, tag: PointerTag) -> Result<u64, ArrayError> {
    if address & !ADDRESS_MASK != 0 {
        return Err(ArrayError::AddressOutOfRange {
            address,
            max: MAX_EXTERNAL_ADDRESS,
        });
    }
    Ok(address | ((tag.0 as u64) << TAG_SHIFT))
}

fn unpack(entry: u64) -> (u64, PointerTag) {
    (entry & ADDRESS_MASK, PointerTag((entry >> TAG_SHIFT) as u16))
}

/// Lock-free table of tagged raw addresses.
pub struct PointerTable {
    entries: Box<[AtomicU64]>,
    next: AtomicU32,
}

// Compile-time assertion: PointerTable must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<PointerTable>();
};

impl PointerTable {
    /// A table with `capacity` entries, entry 0 reserved.
    pub fn new(capacity: u32) -> Self {
        Self {
            entries: (0..capacity.max(1)).map(|_| AtomicU64::new(0)).collect(),
            next: AtomicU32::new(1),
        }
    }

    /// Total entries, including the reserved null entry.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Entries handed out so far, freed ones included.
    pub fn allocated(&self) -> usize {
        self.next.load(Ordering::Acquire) as usize - 1
    }

    fn entry(&self, handle: PointerHandle) -> Result<&AtomicU64, ArrayError> {
        if handle.is_null() || handle.0 >= self.next.load(Ordering::Acquire) {
            return Err(ArrayError::InvalidHandle { handle });
        }
        self.entries
            .get(handle.0 as usize)
            .ok_or(ArrayError::InvalidHandle { handle })
    }

    fn check_tag(entry: u64, handle: PointerHandle, tag: PointerTag) -> Result<u64, ArrayError> {
        let (address, found) = unpack(entry);
        if found == PointerTag::FREE {
            return Err(ArrayError::InvalidHandle { handle });
        }
        if found != tag {
            return Err(ArrayError::TagMismatch { expected: tag, found });
        }
        Ok(address)
    }
}

impl ExternalPointerTable for PointerTable {
    fn allocate(&self, address: u64, tag: PointerTag) -> Result<PointerHandle, ArrayError> {
        debug_assert_ne!(tag, PointerTag::FREE);
        let entry = pack(address, tag)?;
        let capacity = self.entries.len();
        let index = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                ((next as usize) < capacity).then_some(next + 1)
            })
            .map_err(|_| {
                warn!(capacity, "external pointer table full");
                ArrayError::PointerTableFull { capacity }
            })?;
        self.entries[index as usize].store(entry, Ordering::Release);
        Ok(PointerHandle(index))
    }

    fn get(&self, handle: PointerHandle, tag: PointerTag) -> Result<u64, ArrayError> {
        let entry = self.entry(handle)?.load(Ordering::Acquire);
        Self::check_tag(entry, handle, tag)
    }

    fn set(&self, handle: PointerHandle, address: u64, tag: PointerTag) -> Result<(), ArrayError> {
        let slot = self.entry(handle)?;
        Self::check_tag(slot.load(Ordering::Acquire), handle, tag)?;
        slot.store(pack(address, tag)?, Ordering::Release);
        Ok(())
    }

    fn free(&self, handle: PointerHandle) {
        if let Ok(slot) = self.entry(handle) {
            slot.store(0, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: PointerTag = PointerTag(0x11);
    const SOCKET: PointerTag = PointerTag(0x12);

    #[test]
    fn allocate_get_set() {
        let table = PointerTable::new(4);
        let h = table.allocate(0xdead_b000, FILE).unwrap();
        assert_eq!(h, PointerHandle(1));
        assert_eq!(table.get(h, FILE), Ok(0xdead_b000));
        table.set(h, 0x1000, FILE).unwrap();
        assert_eq!(table.get(h, FILE), Ok(0x1000));
        assert_eq!(table.allocated(), 1);
    }

    #[test]
    fn tag_mismatch_is_reported() {
        let table = PointerTable::new(4);
        let h = table.allocate(0x10, FILE).unwrap();
        assert_eq!(
            table.get(h, SOCKET),
            Err(ArrayError::TagMismatch { expected: SOCKET, found: FILE })
        );
        assert!(table.set(h, 0x20, SOCKET).is_err());
        assert_eq!(table.get(h, FILE), Ok(0x10));
    }

    #[test]
    fn null_unallocated_and_freed_handles_are_invalid() {
        let table = PointerTable::new(4);
        assert!(matches!(table.get(PointerHandle::NULL, FILE), Err(ArrayError::InvalidHandle { .. })));
        assert!(matches!(table.get(PointerHandle(2), FILE), Err(ArrayError::InvalidHandle { .. })));
        let h = table.allocate(0x10, FILE).unwrap();
        table.free(h);
        assert_eq!(table.get(h, FILE), Err(ArrayError::InvalidHandle { handle: h }));
        // Freed entries are not reused.
        assert_eq!(table.allocate(0x30, FILE).unwrap(), PointerHandle(2));
    }

    #[test]
    fn wide_addresses_are_rejected() {
        let table = PointerTable::new(4);
        let wide = 0x00ff_0000_0000_1000;
        assert_eq!(
            table.allocate(wide, FILE),
            Err(ArrayError::AddressOutOfRange { address: wide, max: MAX_EXTERNAL_ADDRESS })
        );
        // The rejected request does not use up an entry.
        assert_eq!(table.allocated(), 0);
        let h = table.allocate(MAX_EXTERNAL_ADDRESS, FILE).unwrap();
        assert_eq!(table.get(h, FILE), Ok(MAX_EXTERNAL_ADDRESS));
        assert!(matches!(
            table.set(h, MAX_EXTERNAL_ADDRESS + 1, FILE),
            Err(ArrayError::AddressOutOfRange { .. })
        ));
        assert_eq!(table.get(h, FILE), Ok(MAX_EXTERNAL_ADDRESS));
    }

    #[test]
    fn exhaustion() {
        let table = PointerTable::new(3);
        table.allocate(1, FILE).unwrap();
        table.allocate(2, FILE).unwrap();
        assert_eq!(
            table.allocate(3, FILE),
            Err(ArrayError::PointerTableFull { capacity: 3 })
        );
    }
}
