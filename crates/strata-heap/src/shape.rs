//! Element shape descriptors.
//!
//! A [`Shape`] describes the binary layout of one array kind at the type
//! level: its instance kind, element size, whether elements are tagged,
//! and where the capacity and length words live. The generic engines in
//! [`tagged_array`](crate::tagged_array) and
//! [`primitive_array`](crate::primitive_array) are parameterised by shape,
//! so every kind shares one implementation of allocation, bounds checks,
//! and right-trim.
//!
//! ```text
//! word 0        header (InstanceKind)
//! word 1        capacity (Smi)
//! word 2        length (Smi)            only when LENGTH_WORD != CAPACITY_WORD
//! word H..      elements, ELEMENT_SIZE bytes each, little-endian packed
//! ```

use strata_core::{ArrayError, TAGGED_SIZE};

use crate::config::HeapConfig;
use crate::header::InstanceKind;
use crate::primitive_array::Primitive;

/// One mebibyte.
pub const MB: usize = 1024 * 1024;

/// Upper bound on the byte size of any array object.
///
/// Chosen so that every byte size and element count derived from it stays
/// well inside the small integer range.
pub const MAX_SIZE: usize = 128 * TAGGED_SIZE * MB;

/// Round `bytes` up to a whole number of tagged words.
pub const fn align_to_tagged(bytes: usize) -> usize {
    (bytes + TAGGED_SIZE - 1) & !(TAGGED_SIZE - 1)
}

/// Encode a count field (capacity or length) as a small integer word.
pub(crate) const fn encode_count(count: usize) -> u64 {
    (count as u64) << 1
}

/// Decode a count field written by [`encode_count`].
pub(crate) const fn decode_count(bits: u64) -> usize {
    (bits >> 1) as usize
}

/// Reject capacities above the kind's maximum.
pub(crate) fn check_capacity<S: Shape>(requested: usize) -> Result<(), ArrayError> {
    if requested > S::MAX_CAPACITY {
        return Err(ArrayError::LengthExceedsMaximum {
            requested,
            max: S::MAX_CAPACITY,
        });
    }
    Ok(())
}

/// Type-level layout of an array kind.
pub trait Shape: Sized + Send + Sync + 'static {
    /// Instance kind written into the header.
    const KIND: InstanceKind;

    /// Size of one element in bytes.
    const ELEMENT_SIZE: usize;

    /// Whether elements are tagged words the collector must visit.
    const ELEMENT_IS_REFERENCE: bool;

    /// Word index of the capacity field.
    const CAPACITY_WORD: u32 = 1;

    /// Word index of the length field. Equal to [`Shape::CAPACITY_WORD`]
    /// for kinds whose length is their capacity.
    const LENGTH_WORD: u32 = 1;

    /// Number of header words before the first element.
    const HEADER_WORDS: u32 = 2;

    /// Header size in bytes.
    const HEADER_SIZE: usize = Self::HEADER_WORDS as usize * TAGGED_SIZE;

    /// Whether the kind keeps a logical length separate from its capacity.
    const HAS_LENGTH: bool = Self::LENGTH_WORD != Self::CAPACITY_WORD;

    /// Largest capacity whose [`Shape::size_for`] stays within [`MAX_SIZE`].
    const MAX_CAPACITY: usize = (MAX_SIZE - Self::HEADER_SIZE) / Self::ELEMENT_SIZE;

    /// Allocated byte size of an instance with `capacity` elements.
    fn size_for(capacity: usize) -> usize {
        debug_assert!(capacity <= Self::MAX_CAPACITY);
        align_to_tagged(Self::HEADER_SIZE + capacity * Self::ELEMENT_SIZE)
    }

    /// Byte offset of element `index` from the object start.
    fn offset_of_element_at(index: usize) -> usize {
        Self::HEADER_SIZE + index * Self::ELEMENT_SIZE
    }

    /// Capacity of an instance occupying exactly `size_in_bytes`.
    fn capacity_for_size(size_in_bytes: usize) -> usize {
        debug_assert_eq!(size_in_bytes % TAGGED_SIZE, 0);
        debug_assert!(size_in_bytes >= Self::HEADER_SIZE);
        (size_in_bytes - Self::HEADER_SIZE) / Self::ELEMENT_SIZE
    }

    /// Largest capacity that still fits a regular (non-large-object)
    /// allocation under `config`.
    fn max_regular_capacity(config: &HeapConfig) -> usize {
        config
            .max_regular_object_bytes()
            .saturating_sub(Self::HEADER_SIZE)
            / Self::ELEMENT_SIZE
    }
}

/// A shape whose elements are tagged words.
pub trait TaggedShape: Shape {
    /// Whether weak references may be stored.
    const ALLOWS_WEAK: bool;
}

/// A shape whose elements are raw primitive values.
pub trait PrimitiveShape: Shape {
    /// Element type.
    type Element: Primitive;
}

macro_rules! tagged_shape {
    ($(#[$doc:meta])* $name:ident, $kind:ident, weak = $weak:expr, length_word = $len:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub enum $name {}

        impl Shape for $name {
            const KIND: InstanceKind = InstanceKind::$kind;
            const ELEMENT_SIZE: usize = TAGGED_SIZE;
            const ELEMENT_IS_REFERENCE: bool = true;
            const LENGTH_WORD: u32 = $len;
            const HEADER_WORDS: u32 = if $len == 1 { 2 } else { 3 };
        }

        impl TaggedShape for $name {
            const ALLOWS_WEAK: bool = $weak;
        }
    };
}

tagged_shape!(
    /// Strong tagged slots; length is the capacity.
    FixedArrayShape, FixedArray, weak = false, length_word = 1
);
tagged_shape!(
    /// Strong tagged slots with a separate logical length.
    ArrayListShape, ArrayList, weak = false, length_word = 2
);
tagged_shape!(
    /// Possibly-weak tagged slots; length is the capacity.
    WeakFixedArrayShape, WeakFixedArray, weak = true, length_word = 1
);
tagged_shape!(
    /// Possibly-weak tagged slots with a separate logical length.
    WeakArrayListShape, WeakArrayList, weak = true, length_word = 2
);

macro_rules! primitive_shape {
    ($(#[$doc:meta])* $name:ident, $kind:ident, $elem:ty) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub enum $name {}

        impl Shape for $name {
            const KIND: InstanceKind = InstanceKind::$kind;
            const ELEMENT_SIZE: usize = std::mem::size_of::<$elem>();
            const ELEMENT_IS_REFERENCE: bool = false;
        }

        impl PrimitiveShape for $name {
            type Element = $elem;
        }
    };
}

primitive_shape!(
    /// Raw bytes.
    ByteArrayShape, ByteArray, u8
);
primitive_shape!(
    /// Unboxed IEEE doubles.
    FixedDoubleArrayShape, FixedDoubleArray, f64
);
primitive_shape!(
    /// 32-bit external pointer table handles.
    ExternalPointerArrayShape, ExternalPointerArray, u32
);
