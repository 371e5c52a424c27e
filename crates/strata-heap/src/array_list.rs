//! Growable lists of strong tagged values.

use strata_core::{AccessOrder, AllocationType, ArrayError, BarrierMode, Tagged};
use tracing::debug;

use crate::fixed_array::FixedArray;
use crate::heap::Heap;
use crate::shape::ArrayListShape;
use crate::tagged_array::{capacity_for_length, TaggedArray};

/// A list of strong tagged values with amortised O(1) append.
///
/// The logical length is separate from the backing capacity. Capacity only
/// grows (by reseating onto a new backing array) except through an explicit
/// [`TaggedArray::right_trim`].
pub type ArrayList<'h> = TaggedArray<'h, ArrayListShape>;

impl<'h> TaggedArray<'h, ArrayListShape> {
    /// A new, empty list with room for `capacity` values.
    pub fn new(
        heap: &'h Heap,
        capacity: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Self::allocate(heap, capacity, allocation)
    }

    /// Grow the backing array, if needed, so it can hold `length` values.
    pub fn ensure_space(&mut self, length: usize) -> Result<(), ArrayError> {
        let capacity = self.capacity();
        if capacity >= length {
            return Ok(());
        }
        let new_capacity = capacity_for_length(length);
        let allocation = self.heap().space_of(self.object()).allocation_type();
        let grown = Self::allocate(self.heap(), new_capacity, allocation)?;
        let populated = self.length();
        grown.copy_elements(0, self, 0, populated, BarrierMode::Update);
        grown.set_length(populated, AccessOrder::Relaxed);
        debug!(from = capacity, to = new_capacity, length = populated, "grew array list");
        *self = grown;
        Ok(())
    }

    /// Append `value`.
    pub fn add(&mut self, value: Tagged) -> Result<(), ArrayError> {
        let length = self.length();
        self.ensure_space(length + 1)?;
        self.set(length, value, AccessOrder::Relaxed, BarrierMode::Update);
        self.set_length(length + 1, AccessOrder::AcquireRelease);
        Ok(())
    }

    /// Append two values under a single length update.
    pub fn add_pair(&mut self, first: Tagged, second: Tagged) -> Result<(), ArrayError> {
        let length = self.length();
        self.ensure_space(length + 2)?;
        self.set(length, first, AccessOrder::Relaxed, BarrierMode::Update);
        self.set(length + 1, second, AccessOrder::Relaxed, BarrierMode::Update);
        self.set_length(length + 2, AccessOrder::AcquireRelease);
        Ok(())
    }

    /// Reset slot `index` to the hole without changing the length.
    pub fn clear(&self, index: usize) {
        self.set(index, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Skip);
    }

    /// An exact-length copy of the populated region.
    ///
    /// An empty list yields the heap's canonical empty fixed array.
    pub fn to_fixed_array(&self, allocation: AllocationType) -> Result<FixedArray<'h>, ArrayError> {
        let length = self.length();
        let result = FixedArray::new(self.heap(), length, allocation)?;
        result.copy_elements(0, self, 0, length, BarrierMode::Update);
        Ok(result)
    }
}
