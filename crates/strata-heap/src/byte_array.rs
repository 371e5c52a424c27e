//! Raw byte arrays and the typed views layered on them.
//!
//! [`ByteArray`] holds bytes the collector never scans.
//! [`FixedIntegerArray`] reads and writes fixed-width integers at
//! `header + index * size_of::<T>()`, and [`PodArray`] stores plain-data
//! records with bulk copy-in/copy-out. Both views are ordinary byte arrays
//! in the heap: a walker sees only the byte length.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;
use strata_core::{AllocationType, ArrayError};

use crate::heap::Heap;
use crate::primitive_array::{Primitive, PrimitiveArray};
use crate::shape::{ByteArrayShape, Shape};

/// An array of raw bytes.
pub type ByteArray<'h> = PrimitiveArray<'h, ByteArrayShape>;

impl<'h> PrimitiveArray<'h, ByteArrayShape> {
    /// A zero-filled array of `length` bytes.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Self::allocate(heap, length, allocation)
    }

    /// The byte length to request so that the whole object occupies
    /// exactly `size_in_bytes`.
    pub fn length_for(size_in_bytes: usize) -> usize {
        ByteArrayShape::capacity_for_size(size_in_bytes)
    }

    /// The `index`-th little-endian `u32`.
    ///
    /// # Panics
    ///
    /// Panics if the four bytes are not all within the array.
    pub fn get_int(&self, index: usize) -> u32 {
        self.check_int(index);
        self.load_bits(index * 4, 4) as u32
    }

    /// Store the `index`-th little-endian `u32`.
    pub fn set_int(&self, index: usize, value: u32) {
        self.check_int(index);
        self.store_bits(index * 4, 4, value as u64);
    }

    fn check_int(&self, index: usize) {
        let length = self.length();
        assert!(
            index.checked_mul(4).is_some_and(|at| at + 4 <= length),
            "int index {index} out of bounds for byte array of length {length}"
        );
    }

    /// Copy bytes out starting at `offset`.
    pub fn copy_out_bytes(&self, offset: usize, out: &mut [u8]) -> Result<(), ArrayError> {
        self.check_byte_range(offset, out.len())?;
        self.read_bytes(offset, out);
        Ok(())
    }

    /// Copy bytes in starting at `offset`.
    pub fn copy_in_bytes(&self, offset: usize, data: &[u8]) -> Result<(), ArrayError> {
        self.check_byte_range(offset, data.len())?;
        self.write_bytes(offset, data);
        Ok(())
    }

    fn check_byte_range(&self, offset: usize, len: usize) -> Result<(), ArrayError> {
        let length = self.length();
        match offset.checked_add(len) {
            Some(end) if end <= length => Ok(()),
            _ => Err(ArrayError::OutOfBounds {
                index: offset.saturating_add(len),
                bound: length,
            }),
        }
    }
}

/// Integer types a [`FixedIntegerArray`] may hold.
pub trait FixedInteger: Primitive {}

impl FixedInteger for i8 {}
impl FixedInteger for u8 {}
impl FixedInteger for i16 {}
impl FixedInteger for u16 {}
impl FixedInteger for i32 {}
impl FixedInteger for u32 {}
impl FixedInteger for i64 {}
impl FixedInteger for u64 {}

/// A byte array viewed as `length` integers of type `T`.
pub struct FixedIntegerArray<'h, T: FixedInteger> {
    bytes: ByteArray<'h>,
    _element: PhantomData<T>,
}

/// `i8` elements.
pub type FixedInt8Array<'h> = FixedIntegerArray<'h, i8>;
/// `u8` elements.
pub type FixedUInt8Array<'h> = FixedIntegerArray<'h, u8>;
/// `i16` elements.
pub type FixedInt16Array<'h> = FixedIntegerArray<'h, i16>;
/// `u16` elements.
pub type FixedUInt16Array<'h> = FixedIntegerArray<'h, u16>;
/// `i32` elements.
pub type FixedInt32Array<'h> = FixedIntegerArray<'h, i32>;
/// `u32` elements.
pub type FixedUInt32Array<'h> = FixedIntegerArray<'h, u32>;
/// `i64` elements.
pub type FixedInt64Array<'h> = FixedIntegerArray<'h, i64>;
/// `u64` elements.
pub type FixedUInt64Array<'h> = FixedIntegerArray<'h, u64>;

impl<T: FixedInteger> Clone for FixedIntegerArray<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: FixedInteger> Copy for FixedIntegerArray<'_, T> {}

impl<T: FixedInteger> fmt::Debug for FixedIntegerArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedIntegerArray")
            .field("element", &std::any::type_name::<T>())
            .field("object", &self.bytes.object())
            .field("length", &self.length())
            .finish()
    }
}

impl<'h, T: FixedInteger> FixedIntegerArray<'h, T> {
    /// A zero-filled array of `length` integers.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        let byte_length = byte_length_for::<T>(length)?;
        Ok(Self {
            bytes: ByteArray::new(heap, byte_length, allocation)?,
            _element: PhantomData,
        })
    }

    /// Byte offset of element `index` from the object start.
    pub fn offset_of_element_at(index: usize) -> usize {
        ByteArrayShape::HEADER_SIZE + index * size_of::<T>()
    }

    /// Number of integers.
    pub fn length(&self) -> usize {
        self.bytes.length() / size_of::<T>()
    }

    /// The backing byte array.
    pub fn as_byte_array(&self) -> ByteArray<'h> {
        self.bytes
    }

    /// Integer `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn get(&self, index: usize) -> T {
        self.check_index(index);
        T::from_bits(self.bytes.load_bits(index * size_of::<T>(), size_of::<T>()))
    }

    /// Store integer `index`.
    pub fn set(&self, index: usize, value: T) {
        self.check_index(index);
        self.bytes
            .store_bits(index * size_of::<T>(), size_of::<T>(), value.to_bits());
    }

    fn check_index(&self, index: usize) {
        let length = self.length();
        assert!(index < length, "index {index} out of bounds for integer array of length {length}");
    }
}

/// Left shift applied to a sandbox offset when it is stored.
pub const SANDBOXED_POINTER_SHIFT: u32 = 24;

/// Size in bytes of the address range a sandboxed pointer can name.
pub const SANDBOX_SIZE: u64 = 1 << (64 - SANDBOXED_POINTER_SHIFT);

/// A byte array of word-sized addresses.
///
/// Plain [`get`](Self::get)/[`set`](Self::set) store the raw word. The
/// sandboxed accessors store an address as its offset from a sandbox base,
/// shifted left by [`SANDBOXED_POINTER_SHIFT`], so a corrupted word can
/// only ever name memory inside the sandbox. Raw host pointers that must
/// not be forged belong in an
/// [`ExternalPointerArray`](crate::external::ExternalPointerArray).
#[derive(Clone, Copy, Debug)]
pub struct FixedAddressArray<'h> {
    words: FixedIntegerArray<'h, u64>,
}

impl<'h> FixedAddressArray<'h> {
    /// A zero-filled array of `length` addresses.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Ok(Self {
            words: FixedIntegerArray::new(heap, length, allocation)?,
        })
    }

    /// Number of addresses.
    pub fn length(&self) -> usize {
        self.words.length()
    }

    /// The backing byte array.
    pub fn as_byte_array(&self) -> ByteArray<'h> {
        self.words.as_byte_array()
    }

    /// Raw word `index`.
    pub fn get(&self, index: usize) -> u64 {
        self.words.get(index)
    }

    /// Store raw word `index`.
    pub fn set(&self, index: usize, value: u64) {
        self.words.set(index, value);
    }

    /// The address in slot `index`, decoded against `sandbox_base`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn get_sandboxed_pointer(&self, index: usize, sandbox_base: u64) -> u64 {
        sandbox_base.wrapping_add(self.words.get(index) >> SANDBOXED_POINTER_SHIFT)
    }

    /// Store `address` in slot `index` as an offset from `sandbox_base`.
    ///
    /// Fails with [`ArrayError::AddressOutOfRange`] unless
    /// `sandbox_base <= address < sandbox_base + SANDBOX_SIZE`; the slot is
    /// left unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn set_sandboxed_pointer(
        &self,
        index: usize,
        sandbox_base: u64,
        address: u64,
    ) -> Result<(), ArrayError> {
        let offset = address
            .checked_sub(sandbox_base)
            .filter(|offset| *offset < SANDBOX_SIZE)
            .ok_or(ArrayError::AddressOutOfRange {
                address,
                max: sandbox_base.saturating_add(SANDBOX_SIZE - 1),
            })?;
        self.words.set(index, offset << SANDBOXED_POINTER_SHIFT);
        Ok(())
    }
}

fn byte_length_for<T>(length: usize) -> Result<usize, ArrayError> {
    length
        .checked_mul(size_of::<T>())
        .ok_or(ArrayError::LengthExceedsMaximum {
            requested: length,
            max: ByteArrayShape::MAX_CAPACITY / size_of::<T>().max(1),
        })
}

/// A byte array holding `length` plain-data records of type `T`.
///
/// Records are copied in and out by value; the array never hands out
/// references into heap memory.
pub struct PodArray<'h, T: Pod> {
    bytes: ByteArray<'h>,
    _element: PhantomData<T>,
}

impl<T: Pod> Clone for PodArray<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Pod> Copy for PodArray<'_, T> {}

impl<T: Pod> fmt::Debug for PodArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodArray")
            .field("record", &std::any::type_name::<T>())
            .field("object", &self.bytes.object())
            .field("length", &self.length())
            .finish()
    }
}

impl<'h, T: Pod> PodArray<'h, T> {
    /// A zero-filled array of `length` records.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        assert!(size_of::<T>() > 0, "PodArray records must not be zero-sized");
        let byte_length = byte_length_for::<T>(length)?;
        Ok(Self {
            bytes: ByteArray::new(heap, byte_length, allocation)?,
            _element: PhantomData,
        })
    }

    /// Number of records.
    pub fn length(&self) -> usize {
        self.bytes.length() / size_of::<T>()
    }

    /// The backing byte array.
    pub fn as_byte_array(&self) -> ByteArray<'h> {
        self.bytes
    }

    fn check_records(&self, index: usize, count: usize, buffer_len: usize) -> Result<(), ArrayError> {
        if buffer_len < count {
            return Err(ArrayError::BufferMismatch {
                needed: count,
                provided: buffer_len,
            });
        }
        let length = self.length();
        match index.checked_add(count) {
            Some(end) if end <= length => Ok(()),
            _ => Err(ArrayError::OutOfBounds {
                index: index.saturating_add(count),
                bound: length,
            }),
        }
    }

    /// Copy `count` records starting at `index` into `buffer[..count]`.
    pub fn copy_out(&self, index: usize, buffer: &mut [T], count: usize) -> Result<(), ArrayError> {
        self.check_records(index, count, buffer.len())?;
        let out: &mut [u8] = bytemuck::cast_slice_mut(&mut buffer[..count]);
        self.bytes.read_bytes(index * size_of::<T>(), out);
        Ok(())
    }

    /// Copy `buffer[..count]` into the records starting at `index`.
    pub fn copy_in(&self, index: usize, buffer: &[T], count: usize) -> Result<(), ArrayError> {
        self.check_records(index, count, buffer.len())?;
        let data: &[u8] = bytemuck::cast_slice(&buffer[..count]);
        self.bytes.write_bytes(index * size_of::<T>(), data);
        Ok(())
    }

    /// Whether the first `count` records equal `buffer[..count]` bytewise.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the array length or the buffer.
    pub fn matches(&self, buffer: &[T], count: usize) -> bool {
        self.matches_at(0, buffer, count)
    }

    /// Whether the `count` records starting at `offset` equal
    /// `buffer[..count]` bytewise.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the array length or the buffer.
    pub fn matches_at(&self, offset: usize, buffer: &[T], count: usize) -> bool {
        if let Err(err) = self.check_records(offset, count, buffer.len()) {
            panic!("matches_at({offset}, _, {count}): {err}");
        }
        let data: &[u8] = bytemuck::cast_slice(&buffer[..count]);
        self.bytes.bytes_equal(offset * size_of::<T>(), data)
    }

    /// Record `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn get(&self, index: usize) -> T {
        let mut record = T::zeroed();
        if let Err(err) = self.copy_out(index, std::slice::from_mut(&mut record), 1) {
            panic!("get({index}): {err}");
        }
        record
    }

    /// Store record `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= length`.
    pub fn set(&self, index: usize, value: T) {
        if let Err(err) = self.copy_in(index, std::slice::from_ref(&value), 1) {
            panic!("set({index}): {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_heap;
    use bytemuck::Zeroable;

    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Span {
        start: u32,
        end: u32,
        flags: u16,
        kind: u8,
        pad: u8,
    }

    fn span(i: u32) -> Span {
        Span {
            start: i,
            end: i + 10,
            flags: (i as u16) << 3,
            kind: i as u8,
            pad: 0,
        }
    }

    #[test]
    fn length_for_inverts_size() {
        assert_eq!(ByteArray::length_for(ByteArray::size_for(8)), 8);
        assert_eq!(ByteArray::length_for(48), 32);
    }

    #[test]
    fn ints_are_little_endian() {
        let heap = test_heap();
        let bytes = ByteArray::new(&heap, 12, AllocationType::Young).unwrap();
        bytes.set_int(1, 0x0403_0201);
        assert_eq!(bytes.get(4), 1);
        assert_eq!(bytes.get(7), 4);
        assert_eq!(bytes.get_int(1), 0x0403_0201);
        assert_eq!(bytes.get_int(2), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_int_past_end_panics() {
        let heap = test_heap();
        ByteArray::new(&heap, 6, AllocationType::Young).unwrap().get_int(1);
    }

    #[test]
    fn byte_copy_checks_range() {
        let heap = test_heap();
        let bytes = ByteArray::new(&heap, 4, AllocationType::Young).unwrap();
        assert!(bytes.copy_in_bytes(2, &[1, 2]).is_ok());
        assert_eq!(
            bytes.copy_in_bytes(3, &[1, 2]),
            Err(ArrayError::OutOfBounds { index: 5, bound: 4 })
        );
        let mut out = [0u8; 2];
        bytes.copy_out_bytes(2, &mut out).unwrap();
        assert_eq!(out, [1, 2]);
    }

    #[test]
    fn fixed_integer_arrays() {
        let heap = test_heap();
        let ints = FixedInt16Array::new(&heap, 5, AllocationType::Young).unwrap();
        assert_eq!(ints.length(), 5);
        assert_eq!(ints.as_byte_array().length(), 10);
        ints.set(0, -2);
        ints.set(4, i16::MAX);
        assert_eq!(ints.get(0), -2);
        assert_eq!(ints.get(4), i16::MAX);
        assert_eq!(FixedInt16Array::offset_of_element_at(3), 16 + 6);

        let words = FixedUInt64Array::new(&heap, 2, AllocationType::Old).unwrap();
        words.set(1, u64::MAX - 1);
        assert_eq!(words.get(1), u64::MAX - 1);
        assert_eq!(words.get(0), 0);
    }

    #[test]
    fn sandboxed_pointers_store_shifted_offsets() {
        let heap = test_heap();
        let base = 0x7f00_0000_0000;
        let addresses = FixedAddressArray::new(&heap, 3, AllocationType::Old).unwrap();
        assert_eq!(addresses.as_byte_array().length(), 24);

        addresses.set_sandboxed_pointer(0, base, base + 0x1234).unwrap();
        assert_eq!(addresses.get(0), 0x1234 << SANDBOXED_POINTER_SHIFT);
        assert_eq!(addresses.get_sandboxed_pointer(0, base), base + 0x1234);

        let last = base + SANDBOX_SIZE - 1;
        addresses.set_sandboxed_pointer(1, base, last).unwrap();
        assert_eq!(addresses.get_sandboxed_pointer(1, base), last);

        addresses.set(2, 0xabcd);
        assert_eq!(addresses.get(2), 0xabcd);
    }

    #[test]
    fn sandboxed_pointer_outside_the_sandbox_is_rejected() {
        let heap = test_heap();
        let base = 0x1000_0000;
        let addresses = FixedAddressArray::new(&heap, 1, AllocationType::Young).unwrap();
        addresses.set_sandboxed_pointer(0, base, base + 8).unwrap();
        for address in [base - 1, base + SANDBOX_SIZE, u64::MAX] {
            assert_eq!(
                addresses.set_sandboxed_pointer(0, base, address),
                Err(ArrayError::AddressOutOfRange {
                    address,
                    max: base + SANDBOX_SIZE - 1,
                })
            );
        }
        assert_eq!(addresses.get_sandboxed_pointer(0, base), base + 8);
    }

    #[test]
    fn pod_records_round_trip() {
        let heap = test_heap();
        let pods = PodArray::<Span>::new(&heap, 4, AllocationType::Young).unwrap();
        assert_eq!(pods.length(), 4);
        let records: Vec<Span> = (1..=3).map(span).collect();
        pods.copy_in(1, &records, 3).unwrap();

        let mut out = vec![Span::zeroed(); 3];
        pods.copy_out(1, &mut out, 3).unwrap();
        assert_eq!(out, records);
        assert_eq!(pods.get(0), Span::zeroed());
        assert_eq!(pods.get(2), span(2));

        assert!(pods.matches_at(1, &records, 3));
        assert!(!pods.matches(&records, 1));
        pods.set(0, span(1));
        assert!(pods.matches(&records, 1));
    }

    #[test]
    fn pod_copy_reports_buffer_and_range_errors() {
        let heap = test_heap();
        let pods = PodArray::<Span>::new(&heap, 2, AllocationType::Young).unwrap();
        let records = [span(1)];
        assert_eq!(
            pods.copy_in(0, &records, 2),
            Err(ArrayError::BufferMismatch { needed: 2, provided: 1 })
        );
        assert!(matches!(
            pods.copy_in(2, &records, 1),
            Err(ArrayError::OutOfBounds { .. })
        ));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn copy_in_then_copy_out(index in 0usize..8, values in proptest::collection::vec(any::<u64>(), 0..8)) {
                let heap = test_heap();
                let pods = PodArray::<[u16; 3]>::new(&heap, 16, AllocationType::Young).unwrap();
                let records: Vec<[u16; 3]> = values
                    .iter()
                    .map(|v| [*v as u16, (*v >> 16) as u16, (*v >> 32) as u16])
                    .collect();
                pods.copy_in(index, &records, records.len()).unwrap();
                let mut out = vec![[0u16; 3]; records.len()];
                pods.copy_out(index, &mut out, records.len()).unwrap();
                prop_assert_eq!(&out, &records);
                prop_assert!(pods.matches_at(index, &records, records.len()));
            }
        }
    }
}
