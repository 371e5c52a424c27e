//! Object header words and instance kinds.
//!
//! Every heap object starts with one header word. The low byte is the
//! [`InstanceKind`]; the remaining bits are a kind-specific payload. Only
//! fillers use the payload (their size in words), which is what lets a
//! linear heap walk step over free space without any other metadata.
//!
//! Kind bytes are even, so every header word decodes as a small integer.
//! A scanner that still sees a pre-trim capacity and reads a filler header
//! as a slot therefore never mistakes it for a reference.

use std::fmt;

/// Type tag of a heap object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum InstanceKind {
    /// Free space. Size in words is carried in the header payload.
    Filler = 2,
    /// Fixed-capacity array of strong tagged values.
    FixedArray = 4,
    /// Growable list of strong tagged values.
    ArrayList = 6,
    /// Fixed-capacity array of possibly-weak tagged values.
    WeakFixedArray = 8,
    /// Growable list of possibly-weak tagged values.
    WeakArrayList = 10,
    /// Raw bytes, never scanned.
    ByteArray = 12,
    /// Unboxed doubles, never scanned.
    FixedDoubleArray = 14,
    /// Indices into the external pointer table.
    ExternalPointerArray = 16,
}

impl InstanceKind {
    /// Decode a kind byte. Returns `None` for bytes that name no kind,
    /// which only happens when reading memory that is not an object start.
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(Self::Filler),
            4 => Some(Self::FixedArray),
            6 => Some(Self::ArrayList),
            8 => Some(Self::WeakFixedArray),
            10 => Some(Self::WeakArrayList),
            12 => Some(Self::ByteArray),
            14 => Some(Self::FixedDoubleArray),
            16 => Some(Self::ExternalPointerArray),
            _ => None,
        }
    }

    /// Whether this is an array kind, which is every kind but the filler.
    /// All of them keep their capacity in word 1.
    pub const fn is_array(self) -> bool {
        !matches!(self, Self::Filler)
    }

    /// Whether instances carry tagged slots the collector must visit.
    pub const fn is_reference_bearing(self) -> bool {
        matches!(
            self,
            Self::FixedArray | Self::ArrayList | Self::WeakFixedArray | Self::WeakArrayList
        )
    }
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A decoded header word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderWord(u64);

const KIND_BITS: u32 = 8;

impl HeaderWord {
    /// Header of a non-filler object.
    pub const fn new(kind: InstanceKind) -> Self {
        Self(kind as u64)
    }

    /// Header of a filler spanning `words` words (header included).
    pub const fn filler(words: u32) -> Self {
        Self(((words as u64) << KIND_BITS) | InstanceKind::Filler as u64)
    }

    /// Reinterpret a raw word.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw word.
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// The kind, or `None` if the word is not a valid header.
    pub const fn kind(self) -> Option<InstanceKind> {
        InstanceKind::from_u8(self.0 as u8)
    }

    /// Filler size in words, if this is a filler header.
    pub const fn filler_words(self) -> Option<u32> {
        match self.kind() {
            Some(InstanceKind::Filler) => Some((self.0 >> KIND_BITS) as u32),
            _ => None,
        }
    }
}
