//! Strongly-typed heap addresses and external pointer identifiers.

use std::fmt;

/// Address of a heap object: a segment index and a word offset within it.
///
/// Packed into a single `u64` as `segment << 32 | offset`. Word 0 of every
/// segment is reserved, so no object ever lives at offset 0 and
/// [`ObjectRef::NULL`] (all zero bits) never aliases a real object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// The null reference. Never points at an allocated object.
    pub const NULL: ObjectRef = ObjectRef(0);

    /// Largest segment index that still fits the tagged word encoding.
    ///
    /// A tagged word spends two bits on the tag, leaving 62 bits for the
    /// packed address, so the segment index is limited to 30 bits.
    pub const MAX_SEGMENT: u32 = (1 << 30) - 1;

    /// Build a reference from a segment index and a word offset.
    pub const fn new(segment: u32, offset: u32) -> Self {
        Self(((segment as u64) << 32) | offset as u64)
    }

    /// Reconstruct a reference from its packed representation.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The packed representation.
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Index of the segment holding this object.
    pub const fn segment(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Word offset of the object's header within its segment.
    pub const fn offset(self) -> u32 {
        self.0 as u32
    }

    /// Whether this is [`ObjectRef::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address of the `word`-th word of this object (word 0 is the header).
    pub const fn slot(self, word: u32) -> SlotAddress {
        SlotAddress {
            segment: self.segment(),
            offset: self.offset() + word,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:#x}", self.segment(), self.offset())
    }
}

/// Absolute address of a single word in the heap.
///
/// Passed to the write barrier and to the collector's weak clearing hook
/// so that they can identify the exact slot that changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddress {
    /// Segment index.
    pub segment: u32,
    /// Word offset within the segment.
    pub offset: u32,
}

impl SlotAddress {
    /// The address `words` words past this one.
    pub const fn add(self, words: u32) -> Self {
        Self {
            segment: self.segment,
            offset: self.offset + words,
        }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:#x}", self.segment, self.offset)
    }
}

/// Index into an external pointer table.
///
/// Handle 0 is the null handle: an indirect pointer slot holding it is
/// empty and has no table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerHandle(pub u32);

impl PointerHandle {
    /// The null handle.
    pub const NULL: PointerHandle = PointerHandle(0);

    /// Whether this is [`PointerHandle::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PointerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PointerHandle {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Type tag stored alongside an external pointer table entry.
///
/// Reads must present the same tag that was used on write; a mismatch is
/// reported instead of handing out a pointer of the wrong type. Tag 0 is
/// reserved for free entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerTag(pub u16);

impl PointerTag {
    /// Tag carried by free table entries. Never valid for reads or writes.
    pub const FREE: PointerTag = PointerTag(0);
}

impl fmt::Display for PointerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ref_packs_segment_and_offset() {
        let r = ObjectRef::new(7, 0x40);
        assert_eq!(r.segment(), 7);
        assert_eq!(r.offset(), 0x40);
        assert_eq!(ObjectRef::from_bits(r.to_bits()), r);
        assert!(!r.is_null());
    }

    #[test]
    fn null_is_segment_zero_offset_zero() {
        assert!(ObjectRef::new(0, 0).is_null());
        assert!(!ObjectRef::new(0, 1).is_null());
    }

    #[test]
    fn slot_addresses_are_relative_to_header() {
        let r = ObjectRef::new(2, 100);
        let slot = r.slot(3);
        assert_eq!(slot, SlotAddress { segment: 2, offset: 103 });
        assert_eq!(slot.add(2).offset, 105);
    }

    #[test]
    fn display_formats() {
        assert_eq!(ObjectRef::new(1, 16).to_string(), "1:0x10");
        assert_eq!(PointerTag(0x2a).to_string(), "0x002a");
        assert_eq!(PointerHandle(5).to_string(), "5");
    }
}
