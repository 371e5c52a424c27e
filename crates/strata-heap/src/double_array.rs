//! Unboxed double arrays with an in-band hole.

use std::fmt;

use strata_core::{AllocationType, ArrayError, ObjectRef};

use crate::heap::Heap;
use crate::primitive_array::PrimitiveArray;
use crate::shape::FixedDoubleArrayShape;

/// Bit pattern of the hole. A signalling NaN that arithmetic never
/// produces; [`FixedDoubleArray::set`] canonicalises every NaN it is given
/// so the pattern stays unique.
pub const HOLE_NAN_BITS: u64 = 0xfff7_ffff_fff7_ffff;

/// A fixed-length array of `f64` whose elements may be holes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedDoubleArray<'h> {
    raw: PrimitiveArray<'h, FixedDoubleArrayShape>,
}

impl fmt::Debug for FixedDoubleArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.length()).map(|i| self.get(i)))
            .finish()
    }
}

impl<'h> FixedDoubleArray<'h> {
    /// A new array of `length` zeros.
    pub fn new(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        Ok(Self {
            raw: PrimitiveArray::allocate(heap, length, allocation)?,
        })
    }

    /// A new array of `length` holes.
    pub fn new_with_holes(
        heap: &'h Heap,
        length: usize,
        allocation: AllocationType,
    ) -> Result<Self, ArrayError> {
        let array = Self::new(heap, length, allocation)?;
        array.fill_with_holes(0, length);
        Ok(array)
    }

    /// View `object` as a double array, if its header says so.
    pub fn from_object(heap: &'h Heap, object: ObjectRef) -> Option<Self> {
        PrimitiveArray::from_object(heap, object).map(|raw| Self { raw })
    }

    /// The underlying heap object.
    pub fn object(&self) -> ObjectRef {
        self.raw.object()
    }

    /// Number of elements.
    pub fn length(&self) -> usize {
        self.raw.length()
    }

    /// Allocated byte size of this object.
    pub fn allocated_size(&self) -> usize {
        self.raw.allocated_size()
    }

    /// Raw bits of element `index`, hole included.
    pub fn get_representation(&self, index: usize) -> u64 {
        self.raw.get(index).to_bits()
    }

    /// Element `index`, or `None` for a hole.
    pub fn get(&self, index: usize) -> Option<f64> {
        let value = self.raw.get(index);
        (value.to_bits() != HOLE_NAN_BITS).then_some(value)
    }

    /// Element `index`, which must not be a hole.
    ///
    /// # Panics
    ///
    /// Panics on a hole or an out-of-range index.
    pub fn get_scalar(&self, index: usize) -> f64 {
        match self.get(index) {
            Some(value) => value,
            None => panic!("get_scalar on hole at index {index}"),
        }
    }

    /// Store `value` at `index`. NaNs are stored as the canonical quiet NaN.
    pub fn set(&self, index: usize, value: f64) {
        let value = if value.is_nan() { f64::NAN } else { value };
        self.raw.set(index, value);
    }

    /// Whether element `index` is a hole.
    pub fn is_the_hole(&self, index: usize) -> bool {
        self.get_representation(index) == HOLE_NAN_BITS
    }

    /// Store the hole at `index`.
    pub fn set_the_hole(&self, index: usize) {
        self.raw.set(index, f64::from_bits(HOLE_NAN_BITS));
    }

    /// Store the hole into elements `from..to`.
    pub fn fill_with_holes(&self, from: usize, to: usize) {
        self.raw.fill(from, to, f64::from_bits(HOLE_NAN_BITS));
    }

    /// Move `len` elements from `src_index` to `dst_index`; the ranges may
    /// overlap. Holes move as holes.
    pub fn move_elements(&self, dst_index: usize, src_index: usize, len: usize) {
        self.raw.move_elements(dst_index, src_index, len);
    }
}
