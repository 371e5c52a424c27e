//! Arrays whose slots may hold weak references.
//!
//! A weak slot follows the [`WeakSlot`] state machine: `Empty -> Live` when
//! the mutator stores into it, `Live -> Cleared` when the collector finds
//! the referent dead ([`Heap::clear_weak_slot`]). Mutator code only ever
//! observes `Cleared`. [`WeakArrayList::compact`] removes cleared slots and
//! is the only operation that invalidates indices.

use strata_core::{AccessOrder, AllocationType, ArrayError, BarrierMode, ObjectRef, Tagged, WeakSlot};
use tracing::{debug, instrument};

use crate::heap::Heap;
use crate::shape::{WeakArrayListShape, WeakFixedArrayShape};
use crate::tagged_array::{capacity_for_length, TaggedArray};

/// A fixed-capacity array of possibly-weak tagged values.
pub type WeakFixedArray<'h> = TaggedArray<'h, WeakFixedArrayShape>;

/// A growable list of possibly-weak tagged values.
///
/// `[0, length)` is the populated region; slots past it hold
/// [`Tagged::EMPTY`]. Growth reseats the handle onto a new backing array.
pub type WeakArrayList<'h> = TaggedArray<'h, WeakArrayListShape>;

impl<'h> TaggedArray<'h, WeakFixedArrayShape> {
    /// A new array of `length` empty slots.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Self::allocate(heap, length, allocation)
    }

    /// Grow to exactly `length` slots if currently smaller, copying the
    /// existing slots and reseating `self`.
    pub fn ensure_space(&mut self, length: usize) -> Result<(), ArrayError> {
        let capacity = self.capacity();
        if capacity >= length {
            return Ok(());
        }
        let allocation = self.heap().space_of(self.object()).allocation_type();
        let grown = Self::allocate(self.heap(), length, allocation)?;
        grown.copy_elements(0, self, 0, capacity, BarrierMode::Update);
        debug!(from = capacity, to = length, "grew weak fixed array");
        *self = grown;
        Ok(())
    }

    /// State of slot `index`, loaded with acquire ordering.
    pub fn slot_state(&self, index: usize) -> WeakSlot {
        WeakSlot::from_tagged(self.get(index, AccessOrder::AcquireRelease))
    }
}

impl<'h> TaggedArray<'h, WeakArrayListShape> {
    /// A new, empty list with room for `capacity` values.
    pub fn new(
        heap: &'h Heap,
        capacity: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Self::allocate(heap, capacity, allocation)
    }

    /// Whether the populated region fills the backing array.
    pub fn is_full(&self) -> bool {
        self.length() == self.capacity()
    }

    /// State of populated slot `index`, loaded with acquire ordering.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn slot_state(&self, index: usize) -> WeakSlot {
        let length = self.length();
        assert!(index < length, "index {index} out of bounds for weak list of length {length}");
        WeakSlot::from_tagged(self.get_unchecked(index, AccessOrder::AcquireRelease))
    }

    /// Grow the backing array, if needed, so it can hold `length` values.
    ///
    /// New capacity is [`capacity_for_length`]`(length)`. The populated
    /// region is copied, cleared slots included.
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
        debug!(from = capacity, to = new_capacity, length = populated, "grew weak array list");
        *self = grown;
        Ok(())
    }

    /// Append `value`, growing into a new backing array when full.
    ///
    /// Indices of existing values are preserved. The length increment is a
    /// release store after the element write.
    pub fn add_to_end(&mut self, value: Tagged) -> Result<(), ArrayError> {
        let length = self.length();
        self.ensure_space(length + 1)?;
        self.set(length, value, AccessOrder::Relaxed, BarrierMode::Update);
        self.set_length(length + 1, AccessOrder::AcquireRelease);
        Ok(())
    }

    /// Append `value` and its `companion` as one two-slot entry.
    ///
    /// The companion is usually a small integer (a handler index, flags)
    /// but may be any tagged value. Both slots are written before the
    /// single length update, so a reader never observes half an entry.
    pub fn add_to_end_pair(&mut self, value: Tagged, companion: Tagged) -> Result<(), ArrayError> {
        let length = self.length();
        self.ensure_space(length + 2)?;
        self.set(length, value, AccessOrder::Relaxed, BarrierMode::Update);
        self.set(length + 1, companion, AccessOrder::Relaxed, BarrierMode::Update);
        self.set_length(length + 2, AccessOrder::AcquireRelease);
        Ok(())
    }

    /// Append `value`, reclaiming cleared slots before growing.
    ///
    /// When full, the list is compacted in place if that frees enough room;
    /// otherwise it is copied, compacted, into a backing array sized for the
    /// live elements (which may be smaller than the current one). Indices
    /// are not stable across this call.
    pub fn append(&mut self, value: Tagged) -> Result<(), ArrayError> {
        let length = self.length();
        if length < self.capacity() {
            self.set(length, value, AccessOrder::Relaxed, BarrierMode::Update);
            self.set_length(length + 1, AccessOrder::AcquireRelease);
            return Ok(());
        }

        let new_length = self.count_live_elements() + 1;
        let shrink = new_length < length / 4;
        let grow = 3 * (length / 4) < new_length;
        if shrink || grow {
            let new_capacity = capacity_for_length(new_length);
            *self = self.compacted_copy(new_capacity)?;
        } else {
            self.compact();
        }

        let length = self.length();
        debug_assert!(length < self.capacity());
        self.set(length, value, AccessOrder::Relaxed, BarrierMode::Update);
        self.set_length(length + 1, AccessOrder::AcquireRelease);
        Ok(())
    }

    fn compacted_copy(&self, new_capacity: usize) -> Result<Self, ArrayError> {
        let allocation = self.heap().space_of(self.object()).allocation_type();
        let copy = Self::allocate(self.heap(), new_capacity, allocation)?;
        let mut copied = 0;
        for value in self.iter() {
            if !value.is_cleared() {
                copy.set(copied, value, AccessOrder::Relaxed, BarrierMode::Update);
                copied += 1;
            }
        }
        copy.set_length(copied, AccessOrder::Relaxed);
        debug!(from = self.capacity(), to = new_capacity, live = copied, "reallocated weak array list");
        Ok(copy)
    }

    /// Remove cleared slots with a stable, single-pass partition.
    ///
    /// Live values keep their relative order and the vacated tail is reset
    /// to [`Tagged::EMPTY`]. The backing capacity is kept so that later
    /// appends reuse it; call [`TaggedArray::right_trim`] to return the
    /// tail to the heap. Idempotent. Invalidates indices.
    #[instrument(level = "trace", skip_all)]
    pub fn compact(&self) {
        let length = self.length();
        let mut new_length = 0;
        for index in 0..length {
            let value = self.get_unchecked(index, AccessOrder::Relaxed);
            if value.is_cleared() {
                continue;
            }
            if new_length != index {
                self.set_unchecked(new_length, value, AccessOrder::Relaxed, BarrierMode::Update);
            }
            new_length += 1;
        }
        for index in new_length..length {
            self.set_unchecked(index, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Skip);
        }
        self.set_length(new_length, AccessOrder::AcquireRelease);
    }

    /// Number of populated slots holding a live weak reference.
    pub fn count_live_weak_references(&self) -> usize {
        self.iter().filter(|value| value.is_weak()).count()
    }

    /// Number of populated slots that have not been cleared.
    pub fn count_live_elements(&self) -> usize {
        self.iter().filter(|value| !value.is_cleared()).count()
    }

    /// Remove one occurrence of `value`, searching from the end.
    ///
    /// The last element moves into the vacated slot and the length shrinks
    /// by one. Returns whether `value` was found.
    pub fn remove_one(&self, value: Tagged) -> bool {
        let length = self.length();
        let Some(last) = length.checked_sub(1) else {
            return false;
        };
        for index in (0..length).rev() {
            if self.get_unchecked(index, AccessOrder::Relaxed) != value {
                continue;
            }
            let moved = self.get_unchecked(last, AccessOrder::Relaxed);
            self.set_unchecked(index, moved, AccessOrder::Relaxed, BarrierMode::Update);
            self.set_unchecked(last, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Skip);
            self.set_length(last, AccessOrder::AcquireRelease);
            return true;
        }
        false
    }

    /// Whether `value` occurs in the populated region. Compares tagged
    /// words, so a weak and a strong reference to one object differ.
    pub fn contains(&self, value: Tagged) -> bool {
        self.iter().any(|slot| slot == value)
    }

    /// Iterate over the heap objects referenced from the populated region,
    /// strongly or weakly, skipping cleared slots and small integers.
    pub fn objects(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.iter().filter_map(Tagged::to_object)
    }
}
