//! Fixed-capacity arrays of strong tagged values.

use strata_core::{AccessOrder, AllocationType, ArrayError, BarrierMode, Tagged};
use tracing::debug;

use crate::heap::Heap;
use crate::shape::{FixedArrayShape, Shape};
use crate::tagged_array::{new_capacity_for_index, TaggedArray};

/// A fixed-capacity array of strong tagged values. Its length is its
/// capacity.
pub type FixedArray<'h> = TaggedArray<'h, FixedArrayShape>;

impl<'h> TaggedArray<'h, FixedArrayShape> {
    /// A new array of `length` holes. Length 0 returns the heap's canonical
    /// empty array without allocating.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        if length == 0 {
            return Ok(heap.empty_fixed_array());
        }
        Self::allocate(heap, length, allocation)
    }

    /// Whether this is the heap's canonical empty array.
    pub fn is_canonical_empty(&self) -> bool {
        self.object() == self.heap().empty_fixed_array().object()
    }

    /// Whether slot `index` holds the hole.
    pub fn is_the_hole(&self, index: usize) -> bool {
        self.get(index, AccessOrder::Relaxed).is_empty()
    }

    /// Store the hole into slot `index`.
    pub fn set_the_hole(&self, index: usize) {
        self.set(index, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Skip);
    }

    /// Store the hole into slots `from..to`.
    pub fn fill_with_holes(&self, from: usize, to: usize) {
        assert!(from <= to && to <= self.capacity(), "fill range {from}..{to} out of bounds");
        for index in from..to {
            self.set_unchecked(index, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Skip);
        }
    }

    /// Store `value` at `index`, first growing into a new backing array if
    /// `index` is past the end.
    ///
    /// Growth uses [`new_capacity_for_index`] and reseats `self`; the old
    /// array is left to the collector. An index no fixed array can reach
    /// is reported as [`ArrayError::LengthExceedsMaximum`].
    pub fn set_and_grow(&mut self, index: usize, value: Tagged) -> Result<(), ArrayError> {
        if index >= FixedArrayShape::MAX_CAPACITY {
            return Err(ArrayError::LengthExceedsMaximum {
                requested: index.saturating_add(1),
                max: FixedArrayShape::MAX_CAPACITY,
            });
        }
        let length = self.length();
        if index >= length {
            let capacity = new_capacity_for_index(index, length);
            let allocation = self.heap().space_of(self.object()).allocation_type();
            let grown = Self::allocate(self.heap(), capacity, allocation)?;
            grown.copy_elements(0, self, 0, length, BarrierMode::Update);
            debug!(from = length, to = capacity, "grew fixed array");
            *self = grown;
        }
        self.set(index, value, AccessOrder::Relaxed, BarrierMode::Update);
        Ok(())
    }

    /// Copy into a new array of `new_capacity` slots, truncating or padding
    /// with holes.
    pub fn resize(
        &self,
        new_capacity: usize,
        allocation: AllocationType,
    ) -> Result<FixedArray<'h>, ArrayError> {
        let resized = Self::new(self.heap(), new_capacity, allocation)?;
        let len = self.length().min(new_capacity);
        resized.copy_elements(0, self, 0, len, BarrierMode::Update);
        Ok(resized)
    }

    /// Trim to `new_length` slots, or reseat to the canonical empty array
    /// when `new_length` is 0.
    pub fn right_trim_or_empty(&mut self, new_length: usize) {
        if new_length == 0 {
            *self = self.heap().empty_fixed_array();
        } else {
            self.right_trim(new_length);
        }
    }
}
