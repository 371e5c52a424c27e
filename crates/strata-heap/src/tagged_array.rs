//! Generic storage for arrays of tagged words.
//!
//! [`TaggedArray`] is a borrowed handle to one array object in a [`Heap`].
//! It implements everything the tagged array kinds share: allocation,
//! capacity and length bookkeeping, per-slot access with an explicit
//! [`AccessOrder`] and [`BarrierMode`], atomic swap and compare-and-swap,
//! overlap-aware bulk moves, and right-trim. The kind-specific behaviour
//! lives in [`fixed_array`](crate::fixed_array), [`weak`](crate::weak), and
//! [`array_list`](crate::array_list) as inherent impls on the concrete
//! instantiations.
//!
//! # Bounds
//!
//! `get`/`set` assert `index < capacity` and panic on violation.
//! `try_get`/`try_set` return [`ArrayError::OutOfBounds`] instead. The
//! `*_unchecked` variants only check in debug builds; an out-of-range index
//! there reads or writes a neighbouring heap word and corrupts the heap,
//! but never touches memory outside the heap.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_core::{
    AccessOrder, AllocationType, ArrayError, BarrierMode, ObjectRef, SlotAddress, Tagged,
    TAGGED_SIZE,
};
use tracing::debug;

use crate::filler::install_filler;
use crate::heap::Heap;
use crate::shape::{check_capacity, decode_count, encode_count, TaggedShape};

/// Capacity to allocate when a list must hold `length` elements.
///
/// Adds half again (at least two) so that a run of appends reallocates a
/// logarithmic number of times.
pub const fn capacity_for_length(length: usize) -> usize {
    let slack = length / 2;
    length + if slack > 2 { slack } else { 2 }
}

/// Capacity to grow to so that `index` becomes addressable.
///
/// Applies `capacity + capacity / 2 + 16` until the result exceeds `index`.
/// Saturates at `usize::MAX`, which no array kind can allocate.
pub const fn new_capacity_for_index(index: usize, old_capacity: usize) -> usize {
    let mut capacity = old_capacity;
    loop {
        capacity = capacity.saturating_add(capacity >> 1).saturating_add(16);
        if capacity > index || capacity == usize::MAX {
            return capacity;
        }
    }
}

/// A handle to a tagged array of shape `S` living in a [`Heap`].
pub struct TaggedArray<'h, S: TaggedShape> {
    heap: &'h Heap,
    object: ObjectRef,
    _shape: PhantomData<fn() -> S>,
}

impl<S: TaggedShape> Clone for TaggedArray<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: TaggedShape> Copy for TaggedArray<'_, S> {}

impl<S: TaggedShape> PartialEq for TaggedArray<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.heap, other.heap) && self.object == other.object
    }
}

impl<S: TaggedShape> Eq for TaggedArray<'_, S> {}

impl<S: TaggedShape> fmt::Debug for TaggedArray<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedArray")
            .field("kind", &S::KIND)
            .field("object", &self.object)
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<'h, S: TaggedShape> TaggedArray<'h, S> {
    /// Allocate an array with `capacity` slots, all holding [`Tagged::EMPTY`].
    ///
    /// Kinds with a separate length start at length 0.
    pub fn allocate(
        heap: &'h Heap,
        capacity: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        check_capacity::<S>(capacity)?;
        let object = heap.allocate_raw(S::size_for(capacity), allocation)?;
        let array = Self::from_object_unchecked(heap, object);
        // Not yet published: relaxed stores, ordered by the header release.
        array
            .field(S::CAPACITY_WORD)
            .store(encode_count(capacity), Ordering::Relaxed);
        if S::HAS_LENGTH {
            array
                .field(S::LENGTH_WORD)
                .store(encode_count(0), Ordering::Relaxed);
        }
        for index in 0..capacity {
            array
                .slot_word(index)
                .store(Tagged::EMPTY.to_bits(), Ordering::Relaxed);
        }
        heap.publish_header(object, S::KIND);
        Ok(array)
    }

    /// View `object` as an array of this shape, if its header says so.
    pub fn from_object(heap: &'h Heap, object: ObjectRef) -> Option<Self> {
        if object.is_null() || heap.kind_of(object) != Some(S::KIND) {
            return None;
        }
        Some(Self::from_object_unchecked(heap, object))
    }

    pub(crate) fn from_object_unchecked(heap: &'h Heap, object: ObjectRef) -> Self {
        Self {
            heap,
            object,
            _shape: PhantomData,
        }
    }

    /// The underlying heap object.
    pub fn object(&self) -> ObjectRef {
        self.object
    }

    /// The heap this array lives in.
    pub fn heap(&self) -> &'h Heap {
        self.heap
    }

    /// A strong tagged reference to this array.
    pub fn as_tagged(&self) -> Tagged {
        Tagged::strong(self.object)
    }

    fn field(&self, word: u32) -> &'h AtomicU64 {
        self.heap.word(self.object.slot(word))
    }

    fn slot_word(&self, index: usize) -> &'h AtomicU64 {
        self.heap.word(self.slot_address(index))
    }

    /// Heap address of slot `index`.
    pub fn slot_address(&self, index: usize) -> SlotAddress {
        self.object.slot(S::HEADER_WORDS + index as u32)
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        decode_count(self.field(S::CAPACITY_WORD).load(Ordering::Acquire))
    }

    /// Logical length. Equal to the capacity for kinds without a separate
    /// length field.
    pub fn length(&self) -> usize {
        decode_count(self.field(S::LENGTH_WORD).load(Ordering::Acquire))
    }

    /// Whether the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Store a new logical length.
    pub(crate) fn set_length(&self, length: usize, order: AccessOrder) {
        debug_assert!(S::HAS_LENGTH, "{} has no length field", S::KIND);
        debug_assert!(length <= self.capacity());
        self.field(S::LENGTH_WORD)
            .store(encode_count(length), order.store());
    }

    /// Allocated byte size of this object.
    pub fn allocated_size(&self) -> usize {
        S::size_for(self.capacity())
    }

    /// Allocated byte size of an array with `capacity` slots.
    pub fn size_for(capacity: usize) -> usize {
        S::size_for(capacity)
    }

    #[inline]
    fn check_index(&self, index: usize) {
        let capacity = self.capacity();
        assert!(
            index < capacity,
            "index {index} out of bounds for {} of capacity {capacity}",
            S::KIND
        );
    }

    fn check_range(&self, start: usize, len: usize) {
        let capacity = self.capacity();
        assert!(
            start.checked_add(len).is_some_and(|end| end <= capacity),
            "range {start}..{start}+{len} out of bounds for {} of capacity {capacity}",
            S::KIND
        );
    }

    fn bounds_error(&self, index: usize) -> ArrayError {
        ArrayError::OutOfBounds {
            index,
            bound: self.capacity(),
        }
    }

    /// Load slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn get(&self, index: usize, order: AccessOrder) -> Tagged {
        self.check_index(index);
        self.get_unchecked(index, order)
    }

    /// Load slot `index`, reporting an out-of-range index as an error.
    pub fn try_get(&self, index: usize, order: AccessOrder) -> Result<Tagged, ArrayError> {
        if index >= self.capacity() {
            return Err(self.bounds_error(index));
        }
        Ok(self.get_unchecked(index, order))
    }

    /// Load slot `index` without a release-mode bounds check.
    #[inline]
    pub fn get_unchecked(&self, index: usize, order: AccessOrder) -> Tagged {
        debug_assert!(index < self.capacity());
        Tagged::from_bits(self.slot_word(index).load(order.load()))
    }

    /// Store `value` into slot `index`.
    ///
    /// With [`BarrierMode::Update`] the write barrier is told about every
    /// heap reference stored. Skipping it for a heap reference is a caller
    /// contract violation.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn set(&self, index: usize, value: Tagged, order: AccessOrder, mode: BarrierMode) {
        self.check_index(index);
        self.set_unchecked(index, value, order, mode);
    }

    /// Store into slot `index`, reporting an out-of-range index as an error.
    pub fn try_set(
        &self,
        index: usize,
        value: Tagged,
        order: AccessOrder,
        mode: BarrierMode,
    ) -> Result<(), ArrayError> {
        if index >= self.capacity() {
            return Err(self.bounds_error(index));
        }
        self.set_unchecked(index, value, order, mode);
        Ok(())
    }

    /// Store into slot `index` without a release-mode bounds check.
    #[inline]
    pub fn set_unchecked(&self, index: usize, value: Tagged, order: AccessOrder, mode: BarrierMode) {
        debug_assert!(index < self.capacity());
        self.debug_check_value(value);
        self.slot_word(index).store(value.to_bits(), order.store());
        self.record_write(index, value, mode);
    }

    /// Atomically replace slot `index`, returning the previous value.
    /// Always sequentially consistent.
    pub fn swap(&self, index: usize, value: Tagged, mode: BarrierMode) -> Tagged {
        self.check_index(index);
        self.debug_check_value(value);
        let previous = self
            .slot_word(index)
            .swap(value.to_bits(), Ordering::SeqCst);
        self.record_write(index, value, mode);
        Tagged::from_bits(previous)
    }

    /// Atomically store `value` if slot `index` holds `expected`.
    ///
    /// Returns the value found; the store happened iff it equals
    /// `expected`. Always sequentially consistent.
    pub fn compare_and_swap(
        &self,
        index: usize,
        expected: Tagged,
        value: Tagged,
        mode: BarrierMode,
    ) -> Tagged {
        self.check_index(index);
        self.debug_check_value(value);
        match self.slot_word(index).compare_exchange(
            expected.to_bits(),
            value.to_bits(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(previous) => {
                self.record_write(index, value, mode);
                Tagged::from_bits(previous)
            }
            Err(found) => Tagged::from_bits(found),
        }
    }

    /// Move `len` slots from `src[src_index..]` to `self[dst_index..]`.
    ///
    /// The ranges may overlap when `src` is this array; the result is as if
    /// the source were first copied to a temporary.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds.
    pub fn move_elements<T: TaggedShape>(
        &self,
        dst_index: usize,
        src: &TaggedArray<'_, T>,
        src_index: usize,
        len: usize,
        mode: BarrierMode,
    ) {
        self.check_range(dst_index, len);
        src.check_range(src_index, len);
        if len == 0 {
            return;
        }
        let same_object = std::ptr::eq(self.heap, src.heap) && self.object == src.object;
        if same_object && dst_index > src_index {
            for i in (0..len).rev() {
                self.transfer(dst_index + i, src, src_index + i, mode);
            }
        } else {
            for i in 0..len {
                self.transfer(dst_index + i, src, src_index + i, mode);
            }
        }
    }

    /// Copy `len` slots from `src[src_index..]` to `self[dst_index..]`.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds, or if `src` is this array
    /// and the ranges overlap. Use [`TaggedArray::move_elements`] for
    /// overlapping ranges.
    pub fn copy_elements<T: TaggedShape>(
        &self,
        dst_index: usize,
        src: &TaggedArray<'_, T>,
        src_index: usize,
        len: usize,
        mode: BarrierMode,
    ) {
        self.check_range(dst_index, len);
        src.check_range(src_index, len);
        let same_object = std::ptr::eq(self.heap, src.heap) && self.object == src.object;
        assert!(
            !same_object || dst_index + len <= src_index || src_index + len <= dst_index,
            "copy_elements ranges overlap"
        );
        for i in 0..len {
            self.transfer(dst_index + i, src, src_index + i, mode);
        }
    }

    fn transfer<T: TaggedShape>(
        &self,
        dst_index: usize,
        src: &TaggedArray<'_, T>,
        src_index: usize,
        mode: BarrierMode,
    ) {
        let value = src.get_unchecked(src_index, AccessOrder::Relaxed);
        self.set_unchecked(dst_index, value, AccessOrder::Relaxed, mode);
    }

    /// Shrink the array in place to `new_capacity` slots.
    ///
    /// The freed tail becomes a filler before the new capacity is published
    /// with release ordering. A logical length above `new_capacity` is
    /// lowered to it.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < new_capacity <= capacity`.
    pub fn right_trim(&self, new_capacity: usize) {
        let old_capacity = self.capacity();
        assert!(
            0 < new_capacity && new_capacity <= old_capacity,
            "right_trim to {new_capacity} on {} of capacity {old_capacity}",
            S::KIND
        );
        if new_capacity == old_capacity {
            return;
        }
        let new_size = S::size_for(new_capacity);
        let freed_words = (S::size_for(old_capacity) - new_size) / TAGGED_SIZE;
        install_filler(
            self.heap,
            self.object.slot((new_size / TAGGED_SIZE) as u32),
            freed_words as u32,
        );
        if S::HAS_LENGTH && self.length() > new_capacity {
            self.set_length(new_capacity, AccessOrder::AcquireRelease);
        }
        self.field(S::CAPACITY_WORD)
            .store(encode_count(new_capacity), Ordering::Release);
        debug!(
            object = %self.object,
            kind = %S::KIND,
            old_capacity,
            new_capacity,
            "right-trimmed array"
        );
    }

    /// Iterate over slots `0..length` with relaxed loads.
    pub fn iter(&self) -> impl Iterator<Item = Tagged> + '_ {
        (0..self.length()).map(move |i| self.get_unchecked(i, AccessOrder::Relaxed))
    }

    #[inline]
    fn debug_check_value(&self, value: Tagged) {
        debug_assert!(
            S::ALLOWS_WEAK || !(value.is_weak() || value.is_cleared()),
            "weak value {value} stored into {}",
            S::KIND
        );
    }

    #[inline]
    fn record_write(&self, index: usize, value: Tagged, mode: BarrierMode) {
        if mode == BarrierMode::Update && value.is_heap_object() {
            self.heap
                .barrier()
                .record_write(self.object, self.slot_address(index), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_array::FixedArray;
    use crate::header::InstanceKind;
    use crate::shape::{ArrayListShape, WeakFixedArrayShape};
    use crate::testing::{recording_heap, referents, test_heap};

    #[test]
    fn allocate_fills_with_empty() {
        let heap = test_heap();
        let array = FixedArray::allocate(&heap, 5, AllocationType::Young).unwrap();
        assert_eq!(array.capacity(), 5);
        assert_eq!(array.length(), 5);
        assert_eq!(heap.kind_of(array.object()), Some(InstanceKind::FixedArray));
        for i in 0..5 {
            assert!(array.get(i, AccessOrder::Relaxed).is_empty());
        }
        assert_eq!(array.allocated_size(), 16 + 5 * 8);
    }

    #[test]
    fn allocate_list_starts_at_length_zero() {
        let heap = test_heap();
        let list = TaggedArray::<ArrayListShape>::allocate(&heap, 3, AllocationType::Old).unwrap();
        assert_eq!(list.capacity(), 3);
        assert_eq!(list.length(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn allocate_over_maximum_fails() {
        let heap = test_heap();
        let err = FixedArray::allocate(&heap, usize::MAX / 16, AllocationType::Young).unwrap_err();
        assert!(matches!(err, ArrayError::LengthExceedsMaximum { .. }));
    }

    #[test]
    fn from_object_checks_kind() {
        let heap = test_heap();
        let array = FixedArray::allocate(&heap, 1, AllocationType::Young).unwrap();
        assert!(FixedArray::from_object(&heap, array.object()).is_some());
        assert!(TaggedArray::<WeakFixedArrayShape>::from_object(&heap, array.object()).is_none());
        assert!(FixedArray::from_object(&heap, ObjectRef::NULL).is_none());
    }

    #[test]
    fn set_then_get_with_each_ordering() {
        let heap = test_heap();
        let array = FixedArray::allocate(&heap, 3, AllocationType::Young).unwrap();
        let orders = [AccessOrder::Relaxed, AccessOrder::AcquireRelease, AccessOrder::SeqCst];
        for (i, order) in orders.into_iter().enumerate() {
            array.set(i, Tagged::smi(i as i64 * 10), order, BarrierMode::Skip);
            assert_eq!(array.get(i, order).to_smi(), Some(i as i64 * 10));
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_past_capacity_panics() {
        let heap = test_heap();
        let array = FixedArray::allocate(&heap, 2, AllocationType::Young).unwrap();
        array.get(2, AccessOrder::Relaxed);
    }

    #[test]
    fn try_get_reports_out_of_bounds() {
        let heap = test_heap();
        let array = FixedArray::allocate(&heap, 2, AllocationType::Young).unwrap();
        assert_eq!(
            array.try_get(7, AccessOrder::Relaxed),
            Err(ArrayError::OutOfBounds { index: 7, bound: 2 })
        );
        assert!(array
            .try_set(2, Tagged::smi(1), AccessOrder::Relaxed, BarrierMode::Skip)
            .is_err());
    }

    #[test]
    fn barrier_sees_heap_references_only() {
        let (heap, barrier) = recording_heap();
        let array = FixedArray::allocate(&heap, 4, AllocationType::Young).unwrap();
        let target = referents(&heap, 1)[0];
        array.set(0, Tagged::smi(5), AccessOrder::Relaxed, BarrierMode::Update);
        array.set(1, Tagged::strong(target), AccessOrder::Relaxed, BarrierMode::Update);
        array.set(2, Tagged::strong(target), AccessOrder::Relaxed, BarrierMode::Skip);
        array.set(3, Tagged::EMPTY, AccessOrder::Relaxed, BarrierMode::Update);
        let writes = barrier.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], (array.object(), array.slot_address(1), Tagged::strong(target)));
    }

    #[test]
    fn swap_returns_previous_and_records() {
        let (heap, barrier) = recording_heap();
        let array = FixedArray::allocate(&heap, 1, AllocationType::Young).unwrap();
        let target = referents(&heap, 1)[0];
        let previous = array.swap(0, Tagged::strong(target), BarrierMode::Update);
        assert!(previous.is_empty());
        assert_eq!(array.get(0, AccessOrder::SeqCst), Tagged::strong(target));
        assert_eq!(barrier.writes().len(), 1);
    }

    #[test]
    fn compare_and_swap_only_stores_on_match() {
        let (heap, barrier) = recording_heap();
        let array = FixedArray::allocate(&heap, 1, AllocationType::Young).unwrap();
        let target = referents(&heap, 1)[0];

        let found = array.compare_and_swap(0, Tagged::smi(1), Tagged::strong(target), BarrierMode::Update);
        assert!(found.is_empty());
        assert!(array.get(0, AccessOrder::SeqCst).is_empty());
        assert!(barrier.writes().is_empty());

        let found = array.compare_and_swap(0, Tagged::EMPTY, Tagged::strong(target), BarrierMode::Update);
        assert!(found.is_empty());
        assert_eq!(array.get(0, AccessOrder::SeqCst), Tagged::strong(target));
        assert_eq!(barrier.writes().len(), 1);
    }

    fn numbered(heap: &Heap, n: usize) -> FixedArray<'_> {
        let array = FixedArray::allocate(heap, n, AllocationType::Young).unwrap();
        for i in 0..n {
            array.set(i, Tagged::smi(i as i64), AccessOrder::Relaxed, BarrierMode::Skip);
        }
        array
    }

    fn smis(array: &FixedArray<'_>) -> Vec<i64> {
        array.iter().map(|t| t.to_smi().unwrap_or(-1)).collect()
    }

    #[test]
    fn move_elements_overlapping_forward() {
        let heap = test_heap();
        let array = numbered(&heap, 6);
        array.move_elements(2, &array, 0, 4, BarrierMode::Update);
        assert_eq!(smis(&array), vec![0, 1, 0, 1, 2, 3]);
    }

    #[test]
    fn move_elements_overlapping_backward() {
        let heap = test_heap();
        let array = numbered(&heap, 6);
        array.move_elements(0, &array, 2, 4, BarrierMode::Update);
        assert_eq!(smis(&array), vec![2, 3, 4, 5, 4, 5]);
    }

    #[test]
    fn copy_elements_between_arrays_records_references() {
        let (heap, barrier) = recording_heap();
        let src = FixedArray::allocate(&heap, 3, AllocationType::Young).unwrap();
        let dst = FixedArray::allocate(&heap, 5, AllocationType::Young).unwrap();
        let targets = referents(&heap, 2);
        src.set(0, Tagged::strong(targets[0]), AccessOrder::Relaxed, BarrierMode::Skip);
        src.set(1, Tagged::smi(9), AccessOrder::Relaxed, BarrierMode::Skip);
        src.set(2, Tagged::strong(targets[1]), AccessOrder::Relaxed, BarrierMode::Skip);

        dst.copy_elements(1, &src, 0, 3, BarrierMode::Update);
        assert_eq!(dst.get(1, AccessOrder::Relaxed), Tagged::strong(targets[0]));
        assert_eq!(dst.get(2, AccessOrder::Relaxed).to_smi(), Some(9));
        assert_eq!(dst.get(3, AccessOrder::Relaxed), Tagged::strong(targets[1]));
        let hosts: Vec<_> = barrier.writes().iter().map(|w| w.0).collect();
        assert_eq!(hosts, vec![dst.object(), dst.object()]);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn copy_elements_rejects_overlap() {
        let heap = test_heap();
        let array = numbered(&heap, 4);
        array.copy_elements(1, &array, 0, 2, BarrierMode::Skip);
    }

    #[test]
    fn right_trim_installs_filler_and_shrinks() {
        let heap = test_heap();
        let array = numbered(&heap, 6);
        let next = FixedArray::allocate(&heap, 1, AllocationType::Young).unwrap();
        array.right_trim(2);
        assert_eq!(array.capacity(), 2);
        assert_eq!(array.allocated_size(), 32);
        let filler = ObjectRef::new(array.object().segment(), array.object().offset() + 4);
        assert_eq!(heap.header(filler).filler_words(), Some(4));
        // The next object is still where it was.
        assert_eq!(filler.offset() + 4, next.object().offset());
    }

    #[test]
    fn right_trim_lowers_length() {
        let heap = test_heap();
        let list = TaggedArray::<ArrayListShape>::allocate(&heap, 6, AllocationType::Young).unwrap();
        list.set_length(5, AccessOrder::Relaxed);
        list.right_trim(3);
        assert_eq!(list.length(), 3);
        assert_eq!(list.capacity(), 3);
    }

    #[test]
    fn right_trim_to_same_capacity_is_noop() {
        let heap = test_heap();
        let array = numbered(&heap, 3);
        let before = heap.used_bytes();
        array.right_trim(3);
        assert_eq!(array.capacity(), 3);
        assert_eq!(heap.used_bytes(), before);
    }

    #[test]
    #[should_panic(expected = "right_trim")]
    fn right_trim_to_zero_panics() {
        let heap = test_heap();
        numbered(&heap, 3).right_trim(0);
    }

    #[test]
    fn growth_helpers() {
        assert_eq!(capacity_for_length(0), 2);
        assert_eq!(capacity_for_length(5), 7);
        assert_eq!(capacity_for_length(10), 15);
        assert_eq!(new_capacity_for_index(0, 0), 16);
        assert_eq!(new_capacity_for_index(16, 0), 40);
        assert_eq!(new_capacity_for_index(20, 20), 46);
    }

    #[test]
    fn new_capacity_for_huge_index_saturates() {
        assert_eq!(new_capacity_for_index(usize::MAX, 0), usize::MAX);
        assert_eq!(new_capacity_for_index(usize::MAX - 1, usize::MAX / 2), usize::MAX);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn new_capacity_exceeds_index(old in 0usize..10_000, extra in 0usize..100_000) {
                let index = old + extra;
                let cap = new_capacity_for_index(index, old);
                prop_assert!(cap > index);
                prop_assert!(cap > old);
            }

            #[test]
            fn capacity_for_length_leaves_room(length in 0usize..1_000_000) {
                let cap = capacity_for_length(length);
                prop_assert!(cap >= length + 2);
            }
        }
    }
}
