//! The tagged word encoding shared by every reference-bearing slot.
//!
//! A tagged word is either an inline small integer (Smi) or a reference to
//! a heap object, distinguished by its low bits:
//!
//! ```text
//! ...payload...0    Smi, value = word >> 1 (arithmetic)
//! ..address..01     strong reference
//! ..address..11     weak reference
//! 0.........01      EMPTY   (strong reference to null)
//! 0.........11      CLEARED (weak reference to null)
//! ```
//!
//! The in-place representation is always one `u64`. [`Tagged::decode`]
//! turns it into a [`TaggedKind`] so that callers match on explicit states
//! rather than on bit patterns.

use std::fmt;

use crate::id::ObjectRef;

/// Size of one tagged slot in bytes.
pub const TAGGED_SIZE: usize = 8;

/// Smallest value representable as an inline small integer.
pub const SMI_MIN: i64 = i64::MIN >> 1;

/// Largest value representable as an inline small integer.
pub const SMI_MAX: i64 = i64::MAX >> 1;

const SMI_TAG_MASK: u64 = 0b1;
const HEAP_TAG_MASK: u64 = 0b11;
const STRONG_TAG: u64 = 0b01;
const WEAK_TAG: u64 = 0b11;
const TAG_BITS: u32 = 2;

/// A single tagged word as stored in a heap slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tagged(u64);

impl Tagged {
    /// The hole: value of a slot that has never been written.
    pub const EMPTY: Tagged = Tagged(STRONG_TAG);

    /// Sentinel written by the collector into a weak slot whose referent died.
    pub const CLEARED: Tagged = Tagged(WEAK_TAG);

    /// Reinterpret a raw word.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw word.
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Encode an inline small integer.
    ///
    /// # Panics
    ///
    /// Panics if `value` is outside `SMI_MIN..=SMI_MAX`.
    pub fn smi(value: i64) -> Self {
        match Self::try_smi(value) {
            Some(t) => t,
            None => panic!("{value} is outside the small integer range"),
        }
    }

    /// Encode an inline small integer, or `None` if it does not fit.
    pub const fn try_smi(value: i64) -> Option<Self> {
        if value < SMI_MIN || value > SMI_MAX {
            None
        } else {
            Some(Self((value << 1) as u64))
        }
    }

    /// A strong reference to `object`.
    pub const fn strong(object: ObjectRef) -> Self {
        Self((object.to_bits() << TAG_BITS) | STRONG_TAG)
    }

    /// A weak reference to `object`.
    pub const fn weak(object: ObjectRef) -> Self {
        Self((object.to_bits() << TAG_BITS) | WEAK_TAG)
    }

    /// Whether this is an inline small integer.
    pub const fn is_smi(self) -> bool {
        self.0 & SMI_TAG_MASK == 0
    }

    /// Whether this is the hole.
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Whether this is the cleared weak sentinel.
    pub const fn is_cleared(self) -> bool {
        self.0 == Self::CLEARED.0
    }

    /// Whether this is a strong reference to a real object.
    pub const fn is_strong(self) -> bool {
        self.0 & HEAP_TAG_MASK == STRONG_TAG && !self.is_empty()
    }

    /// Whether this is a weak reference to a real object.
    pub const fn is_weak(self) -> bool {
        self.0 & HEAP_TAG_MASK == WEAK_TAG && !self.is_cleared()
    }

    /// Whether this refers to a heap object, strongly or weakly.
    ///
    /// These are exactly the values a write barrier must be told about.
    pub const fn is_heap_object(self) -> bool {
        self.is_strong() || self.is_weak()
    }

    /// The small integer payload, if this is a Smi.
    pub const fn to_smi(self) -> Option<i64> {
        if self.is_smi() {
            Some((self.0 as i64) >> 1)
        } else {
            None
        }
    }

    /// The referenced object, if this is a strong or weak reference.
    pub const fn to_object(self) -> Option<ObjectRef> {
        if self.is_heap_object() {
            Some(ObjectRef::from_bits(self.0 >> TAG_BITS))
        } else {
            None
        }
    }

    /// The same reference with the weak tag removed. Other values unchanged.
    pub const fn to_strong(self) -> Self {
        if self.is_weak() {
            Self((self.0 & !HEAP_TAG_MASK) | STRONG_TAG)
        } else {
            self
        }
    }

    /// The same reference with the weak tag set. Other values unchanged.
    pub const fn to_weak(self) -> Self {
        if self.is_strong() {
            Self(self.0 | WEAK_TAG)
        } else {
            self
        }
    }

    /// Decode into an explicit state.
    pub const fn decode(self) -> TaggedKind {
        if self.is_smi() {
            TaggedKind::Smi((self.0 as i64) >> 1)
        } else if self.is_empty() {
            TaggedKind::Empty
        } else if self.is_cleared() {
            TaggedKind::Cleared
        } else if self.0 & HEAP_TAG_MASK == WEAK_TAG {
            TaggedKind::Weak(ObjectRef::from_bits(self.0 >> TAG_BITS))
        } else {
            TaggedKind::Strong(ObjectRef::from_bits(self.0 >> TAG_BITS))
        }
    }
}

impl From<ObjectRef> for Tagged {
    fn from(object: ObjectRef) -> Self {
        Self::strong(object)
    }
}

impl fmt::Debug for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            TaggedKind::Empty => write!(f, "<empty>"),
            TaggedKind::Cleared => write!(f, "<cleared>"),
            TaggedKind::Smi(v) => write!(f, "smi({v})"),
            TaggedKind::Strong(r) => write!(f, "strong({r})"),
            TaggedKind::Weak(r) => write!(f, "weak({r})"),
        }
    }
}

/// Decoded view of a [`Tagged`] word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaggedKind {
    /// Never written (the hole).
    Empty,
    /// Inline small integer.
    Smi(i64),
    /// Strong reference.
    Strong(ObjectRef),
    /// Weak reference whose referent is still alive.
    Weak(ObjectRef),
    /// Weak reference cleared by the collector.
    Cleared,
}

/// State of a weak list slot.
///
/// Transitions are `Empty -> Live` on insertion and `Live -> Cleared` when
/// the collector finds the referent unreachable. Mutator code never
/// produces `Cleared`; it only observes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeakSlot {
    /// Outside the populated region, or never written.
    Empty,
    /// A reference (strong or weak) or an inline companion value.
    Live(Tagged),
    /// Cleared by the collector; removed by the next compaction.
    Cleared,
}

impl WeakSlot {
    /// Classify a raw slot value.
    pub const fn from_tagged(value: Tagged) -> Self {
        if value.is_empty() {
            WeakSlot::Empty
        } else if value.is_cleared() {
            WeakSlot::Cleared
        } else {
            WeakSlot::Live(value)
        }
    }

    /// Whether the slot holds a live value.
    pub const fn is_live(self) -> bool {
        matches!(self, WeakSlot::Live(_))
    }
}
