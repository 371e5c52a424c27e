//! Generic storage for arrays of raw primitive elements.
//!
//! Elements are packed little-endian into the heap words after the header;
//! an element never straddles a word because every element size is a power
//! of two no larger than a word. Primitive arrays are opaque to the
//! collector and never touch the write barrier.
//!
//! Sub-word stores go through a compare-exchange loop on the containing
//! word, so neighbouring elements are never torn. Byte-range writes use
//! release stores and byte-range reads use acquire loads; a reader that
//! observes the last word of a record written by
//! [`PrimitiveArray::write_bytes`] therefore observes the whole record.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_core::{AllocationType, ArrayError, ObjectRef, TAGGED_SIZE};

use crate::heap::Heap;
use crate::shape::{check_capacity, decode_count, encode_count, PrimitiveShape};

/// A fixed-width value that can be stored in a primitive array.
pub trait Primitive: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The value's bits, zero-extended to 64.
    fn to_bits(self) -> u64;

    /// Rebuild a value from the low `size_of::<Self>()` bytes of `bits`.
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_primitive_int {
    ($($t:ty => $u:ty),* $(,)?) => {
        $(
            impl Primitive for $t {
                #[inline]
                fn to_bits(self) -> u64 {
                    self as $u as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $u as $t
                }
            }
        )*
    };
}

impl_primitive_int!(
    u8 => u8, i8 => u8, u16 => u16, i16 => u16,
    u32 => u32, i32 => u32, u64 => u64, i64 => u64,
);

impl Primitive for f32 {
    fn to_bits(self) -> u64 {
        f32::to_bits(self) as u64
    }

    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl Primitive for f64 {
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

/// A handle to a primitive array of shape `S` living in a [`Heap`].
pub struct PrimitiveArray<'h, S: PrimitiveShape> {
    heap: &'h Heap,
    object: ObjectRef,
    _shape: PhantomData<fn() -> S>,
}

impl<S: PrimitiveShape> Clone for PrimitiveArray<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: PrimitiveShape> Copy for PrimitiveArray<'_, S> {}

impl<S: PrimitiveShape> PartialEq for PrimitiveArray<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.heap, other.heap) && self.object == other.object
    }
}

impl<S: PrimitiveShape> Eq for PrimitiveArray<'_, S> {}

impl<S: PrimitiveShape> fmt::Debug for PrimitiveArray<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveArray")
            .field("kind", &S::KIND)
            .field("object", &self.object)
            .field("length", &self.length())
            .finish()
    }
}

impl<'h, S: PrimitiveShape> PrimitiveArray<'h, S> {
    /// Allocate a zero-filled array of `length` elements.
    pub fn allocate(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        check_capacity::<S>(length)?;
        let size = S::size_for(length);
        let object = heap.allocate_raw(size, allocation)?;
        let array = Self::from_object_unchecked(heap, object);
        heap.word(object.slot(S::CAPACITY_WORD))
            .store(encode_count(length), Ordering::Relaxed);
        for word in S::HEADER_WORDS..(size / TAGGED_SIZE) as u32 {
            heap.word(object.slot(word)).store(0, Ordering::Relaxed);
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

    /// Number of elements.
    pub fn length(&self) -> usize {
        decode_count(
            self.heap
                .word(self.object.slot(S::CAPACITY_WORD))
                .load(Ordering::Acquire),
        )
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Length in bytes of the element region.
    pub fn byte_length(&self) -> usize {
        self.length() * S::ELEMENT_SIZE
    }

    /// Allocated byte size of this object.
    pub fn allocated_size(&self) -> usize {
        S::size_for(self.length())
    }

    /// Allocated byte size of an array with `length` elements.
    pub fn size_for(length: usize) -> usize {
        S::size_for(length)
    }

    #[inline]
    fn body_word(&self, word: usize) -> &'h AtomicU64 {
        self.heap
            .word(self.object.slot(S::HEADER_WORDS + word as u32))
    }

    #[inline]
    fn check_index(&self, index: usize) {
        let length = self.length();
        assert!(
            index < length,
            "index {index} out of bounds for {} of length {length}",
            S::KIND
        );
    }

    /// Element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    #[inline]
    pub fn get(&self, index: usize) -> S::Element {
        self.check_index(index);
        self.get_unchecked(index)
    }

    /// Element `index`, reporting an out-of-range index as an error.
    pub fn try_get(&self, index: usize) -> Result<S::Element, ArrayError> {
        let length = self.length();
        if index >= length {
            return Err(ArrayError::OutOfBounds { index, bound: length });
        }
        Ok(self.get_unchecked(index))
    }

    /// Element `index` without a release-mode bounds check.
    #[inline]
    pub fn get_unchecked(&self, index: usize) -> S::Element {
        debug_assert!(index < self.length());
        S::Element::from_bits(self.load_bits(index * S::ELEMENT_SIZE, S::ELEMENT_SIZE))
    }

    /// Store `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    #[inline]
    pub fn set(&self, index: usize, value: S::Element) {
        self.check_index(index);
        self.set_unchecked(index, value);
    }

    /// Store at `index`, reporting an out-of-range index as an error.
    pub fn try_set(&self, index: usize, value: S::Element) -> Result<(), ArrayError> {
        let length = self.length();
        if index >= length {
            return Err(ArrayError::OutOfBounds { index, bound: length });
        }
        self.set_unchecked(index, value);
        Ok(())
    }

    /// Store at `index` without a release-mode bounds check.
    #[inline]
    pub fn set_unchecked(&self, index: usize, value: S::Element) {
        debug_assert!(index < self.length());
        self.store_bits(index * S::ELEMENT_SIZE, S::ELEMENT_SIZE, value.to_bits());
    }

    /// Store `value` into elements `from..to`.
    pub fn fill(&self, from: usize, to: usize, value: S::Element) {
        assert!(from <= to && to <= self.length(), "fill range {from}..{to} out of bounds");
        for index in from..to {
            self.set_unchecked(index, value);
        }
    }

    /// Move `len` elements from `src_index` to `dst_index` within this
    /// array. The ranges may overlap.
    pub fn move_elements(&self, dst_index: usize, src_index: usize, len: usize) {
        let length = self.length();
        assert!(
            dst_index.max(src_index).checked_add(len).is_some_and(|end| end <= length),
            "move of {len} elements from {src_index} to {dst_index} out of bounds for length {length}"
        );
        if dst_index > src_index {
            for i in (0..len).rev() {
                self.set_unchecked(dst_index + i, self.get_unchecked(src_index + i));
            }
        } else {
            for i in 0..len {
                self.set_unchecked(dst_index + i, self.get_unchecked(src_index + i));
            }
        }
    }

    /// Copy `len` elements from `src[src_index..]` into `self[dst_index..]`.
    pub fn copy_elements(&self, dst_index: usize, src: &Self, src_index: usize, len: usize) {
        if self == src {
            self.move_elements(dst_index, src_index, len);
            return;
        }
        assert!(
            src_index.checked_add(len).is_some_and(|end| end <= src.length())
                && dst_index.checked_add(len).is_some_and(|end| end <= self.length()),
            "copy of {len} elements out of bounds"
        );
        for i in 0..len {
            self.set_unchecked(dst_index + i, src.get_unchecked(src_index + i));
        }
    }

    /// Read `width` bytes (1, 2, 4, or 8) at `byte_offset` into the body.
    /// The offset must be a multiple of `width`.
    pub(crate) fn load_bits(&self, byte_offset: usize, width: usize) -> u64 {
        debug_assert!(width.is_power_of_two() && width <= TAGGED_SIZE);
        debug_assert_eq!(byte_offset % width, 0);
        let word = self.body_word(byte_offset / TAGGED_SIZE).load(Ordering::Relaxed);
        if width == TAGGED_SIZE {
            return word;
        }
        let shift = (byte_offset % TAGGED_SIZE) * 8;
        (word >> shift) & ((1u64 << (width * 8)) - 1)
    }

    /// Write the low `width` bytes of `bits` at `byte_offset`.
    pub(crate) fn store_bits(&self, byte_offset: usize, width: usize, bits: u64) {
        debug_assert!(width.is_power_of_two() && width <= TAGGED_SIZE);
        debug_assert_eq!(byte_offset % width, 0);
        let word = self.body_word(byte_offset / TAGGED_SIZE);
        if width == TAGGED_SIZE {
            word.store(bits, Ordering::Relaxed);
            return;
        }
        let shift = (byte_offset % TAGGED_SIZE) * 8;
        let mask = ((1u64 << (width * 8)) - 1) << shift;
        let value = (bits << shift) & mask;
        // The closure always returns `Some`, so the update cannot fail.
        let _ = word.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |w| {
            Some((w & !mask) | value)
        });
    }

    /// Copy `out.len()` bytes starting at `byte_offset` into `out`.
    pub(crate) fn read_bytes(&self, byte_offset: usize, out: &mut [u8]) {
        debug_assert!(byte_offset + out.len() <= self.byte_length());
        let mut done = 0;
        while done < out.len() {
            let at = byte_offset + done;
            let start = at % TAGGED_SIZE;
            let n = (TAGGED_SIZE - start).min(out.len() - done);
            let bytes = self
                .body_word(at / TAGGED_SIZE)
                .load(Ordering::Acquire)
                .to_le_bytes();
            out[done..done + n].copy_from_slice(&bytes[start..start + n]);
            done += n;
        }
    }

    /// Copy `data` into the body starting at `byte_offset`.
    pub(crate) fn write_bytes(&self, byte_offset: usize, data: &[u8]) {
        debug_assert!(byte_offset + data.len() <= self.byte_length());
        let mut done = 0;
        while done < data.len() {
            let at = byte_offset + done;
            let start = at % TAGGED_SIZE;
            let n = (TAGGED_SIZE - start).min(data.len() - done);
            let word = self.body_word(at / TAGGED_SIZE);
            let mut chunk = [0u8; TAGGED_SIZE];
            chunk[start..start + n].copy_from_slice(&data[done..done + n]);
            let value = u64::from_le_bytes(chunk);
            if n == TAGGED_SIZE {
                word.store(value, Ordering::Release);
            } else {
                let mask = ((1u64 << (n * 8)) - 1) << (start * 8);
                let _ = word.fetch_update(Ordering::Release, Ordering::Relaxed, |w| {
                    Some((w & !mask) | value)
                });
            }
            done += n;
        }
    }

    /// Whether the body bytes at `byte_offset` equal `data`.
    pub(crate) fn bytes_equal(&self, byte_offset: usize, data: &[u8]) -> bool {
        let mut buf = [0u8; TAGGED_SIZE];
        data.chunks(TAGGED_SIZE).enumerate().all(|(i, chunk)| {
            let out = &mut buf[..chunk.len()];
            self.read_bytes(byte_offset + i * TAGGED_SIZE, out);
            out == chunk
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::InstanceKind;
    use crate::shape::{ByteArrayShape, ExternalPointerArrayShape, FixedDoubleArrayShape};
    use crate::testing::test_heap;

    type Bytes<'h> = PrimitiveArray<'h, ByteArrayShape>;
    type Handles<'h> = PrimitiveArray<'h, ExternalPointerArrayShape>;

    #[test]
    fn allocate_is_zeroed() {
        let heap = test_heap();
        let bytes = Bytes::allocate(&heap, 13, AllocationType::Young).unwrap();
        assert_eq!(bytes.length(), 13);
        assert_eq!(bytes.allocated_size(), 32);
        assert!((0..13).all(|i| bytes.get(i) == 0));
        assert_eq!(heap.kind_of(bytes.object()), Some(InstanceKind::ByteArray));
    }

    #[test]
    fn sub_word_elements_do_not_disturb_neighbours() {
        let heap = test_heap();
        let bytes = Bytes::allocate(&heap, 16, AllocationType::Young).unwrap();
        for i in 0..16 {
            bytes.set(i, i as u8 * 3 + 1);
        }
        bytes.set(7, 0xff);
        assert_eq!(bytes.get(6), 19);
        assert_eq!(bytes.get(7), 0xff);
        assert_eq!(bytes.get(8), 25);
    }

    #[test]
    fn u32_elements() {
        let heap = test_heap();
        let handles = Handles::allocate(&heap, 3, AllocationType::Young).unwrap();
        handles.set(1, u32::MAX);
        handles.set(2, 7);
        assert_eq!(handles.get(0), 0);
        assert_eq!(handles.get(1), u32::MAX);
        assert_eq!(handles.get(2), 7);
    }

    #[test]
    fn try_access_reports_out_of_bounds() {
        let heap = test_heap();
        let bytes = Bytes::allocate(&heap, 2, AllocationType::Young).unwrap();
        assert_eq!(bytes.try_get(2), Err(ArrayError::OutOfBounds { index: 2, bound: 2 }));
        assert!(bytes.try_set(5, 1).is_err());
        assert!(bytes.try_set(1, 1).is_ok());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_past_length_panics() {
        let heap = test_heap();
        Bytes::allocate(&heap, 4, AllocationType::Young).unwrap().set(4, 0);
    }

    #[test]
    fn byte_ranges_cross_word_boundaries() {
        let heap = test_heap();
        let bytes = Bytes::allocate(&heap, 24, AllocationType::Young).unwrap();
        let data: Vec<u8> = (100..113).collect();
        bytes.write_bytes(5, &data);
        let mut out = vec![0u8; 13];
        bytes.read_bytes(5, &mut out);
        assert_eq!(out, data);
        assert_eq!(bytes.get(4), 0);
        assert_eq!(bytes.get(18), 0);
        assert!(bytes.bytes_equal(5, &data));
        assert!(!bytes.bytes_equal(4, &data));
    }

    #[test]
    fn move_elements_overlapping() {
        let heap = test_heap();
        let doubles = PrimitiveArray::<FixedDoubleArrayShape>::allocate(&heap, 5, AllocationType::Young).unwrap();
        for i in 0..5 {
            doubles.set(i, i as f64);
        }
        doubles.move_elements(1, 0, 4);
        let values: Vec<f64> = (0..5).map(|i| doubles.get(i)).collect();
        assert_eq!(values, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn copy_elements_between_arrays() {
        let heap = test_heap();
        let a = Bytes::allocate(&heap, 4, AllocationType::Young).unwrap();
        let b = Bytes::allocate(&heap, 4, AllocationType::Young).unwrap();
        a.fill(0, 4, 9);
        b.copy_elements(1, &a, 0, 3);
        assert_eq!((0..4).map(|i| b.get(i)).collect::<Vec<_>>(), vec![0, 9, 9, 9]);
    }

    #[test]
    fn signed_values_round_trip() {
        assert_eq!(<i8 as Primitive>::from_bits((-3i8).to_bits()), -3);
        assert_eq!(<i16 as Primitive>::from_bits(Primitive::to_bits(i16::MIN)), i16::MIN);
        assert_eq!(<i64 as Primitive>::from_bits(Primitive::to_bits(-1i64)), -1);
        assert_eq!(Primitive::to_bits(-1i32), u32::MAX as u64);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn byte_ranges_read_back(offset in 0usize..40, data in proptest::collection::vec(any::<u8>(), 0..40)) {
                let heap = test_heap();
                let bytes = Bytes::allocate(&heap, 80, AllocationType::Young).unwrap();
                bytes.write_bytes(offset, &data);
                let mut out = vec![0u8; data.len()];
                bytes.read_bytes(offset, &mut out);
                prop_assert_eq!(out, data);
                for i in 0..offset {
                    prop_assert_eq!(bytes.get(i), 0);
                }
            }
        }
    }
}
