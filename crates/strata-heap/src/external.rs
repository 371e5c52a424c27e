//! Arrays of indirect pointers into the external pointer table.
//!
//! The array body holds 32-bit [`PointerHandle`]s, never raw addresses.
//! Slots start zeroed (the null handle) and a table entry is allocated the
//! first time a slot is written.

use std::fmt;

use strata_core::{AllocationType, ArrayError, ObjectRef, PointerHandle, PointerTag};

use crate::heap::Heap;
use crate::primitive_array::PrimitiveArray;
use crate::shape::ExternalPointerArrayShape;

/// A fixed-length array of lazily-allocated external pointer slots.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExternalPointerArray<'h> {
    raw: PrimitiveArray<'h, ExternalPointerArrayShape>,
}

impl fmt::Debug for ExternalPointerArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalPointerArray")
            .field("object", &self.object())
            .field("length", &self.length())
            .finish()
    }
}

impl<'h> ExternalPointerArray<'h> {
    /// A new array of `length` empty slots. No table entries are allocated.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Ok(Self {
            raw: PrimitiveArray::allocate(heap, length, allocation)?,
        })
    }

    /// View `object` as an external pointer array, if its header says so.
    pub fn from_object(heap: &'h Heap, object: ObjectRef) -> Option<Self> {
        PrimitiveArray::from_object(heap, object).map(|raw| Self { raw })
    }

    /// The underlying heap object.
    pub fn object(&self) -> ObjectRef {
        self.raw.object()
    }

    /// Number of slots.
    pub fn length(&self) -> usize {
        self.raw.length()
    }

    /// Allocated byte size of this object.
    pub fn allocated_size(&self) -> usize {
        self.raw.allocated_size()
    }

    /// The table handle stored in slot `index`; null if never written.
    pub fn handle(&self, index: usize) -> Result<PointerHandle, ArrayError> {
        self.raw.try_get(index).map(PointerHandle)
    }

    /// Resolve slot `index` through the table, checking `tag`.
    pub fn get(&self, index: usize, tag: PointerTag) -> Result<u64, ArrayError> {
        let handle = self.handle(index)?;
        if handle.is_null() {
            return Err(ArrayError::EmptySlot { index });
        }
        self.raw.heap().pointer_table().get(handle, tag)
    }

    /// Store `address` in slot `index` under `tag`.
    ///
    /// The first write allocates a table entry; later writes update it and
    /// must use the same tag. Addresses above
    /// [`MAX_EXTERNAL_ADDRESS`](crate::pointer_table::MAX_EXTERNAL_ADDRESS)
    /// are rejected with [`ArrayError::AddressOutOfRange`] and leave the
    /// slot unchanged.
    pub fn set(&self, index: usize, address: u64, tag: PointerTag) -> Result<(), ArrayError> {
        let handle = self.handle(index)?;
        let table = self.raw.heap().pointer_table();
        if handle.is_null() {
            let handle = table.allocate(address, tag)?;
            self.raw.set(index, handle.0);
            Ok(())
        } else {
            table.set(handle, address, tag)
        }
    }

    /// Release slot `index` back to empty, freeing its table entry.
    pub fn clear(&self, index: usize) -> Result<(), ArrayError> {
        let handle = self.handle(index)?;
        if !handle.is_null() {
            self.raw.set(index, PointerHandle::NULL.0);
            self.raw.heap().pointer_table().free(handle);
        }
        Ok(())
    }
}
