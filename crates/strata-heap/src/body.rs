//! Per-kind body descriptors.
//!
//! A [`BodyDescriptor`] tells the collector how big an object is and which
//! byte ranges of it hold tagged references. Sizes are derived from the
//! header and the capacity word alone, so a descriptor can be built for
//! any object a walker reaches.

use std::ops::Range;
use std::sync::atomic::Ordering;

use smallvec::SmallVec;
use strata_core::{ObjectRef, PointerHandle, SlotAddress, Tagged, TAGGED_SIZE};

use crate::header::InstanceKind;
use crate::heap::Heap;
use crate::shape::{
    decode_count, ArrayListShape, ByteArrayShape, ExternalPointerArrayShape, FixedArrayShape,
    FixedDoubleArrayShape, Shape, WeakArrayListShape, WeakFixedArrayShape,
};

/// How the collector must treat a byte range of an object body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// Tagged words that are strong references or small integers.
    Strong,
    /// Tagged words that may also be weak references or cleared.
    MaybeWeak,
    /// 32-bit external pointer table handles.
    ExternalPointer,
}

/// A typed byte range within an object, relative to the object start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyRange {
    /// Slot treatment.
    pub kind: SlotKind,
    /// Byte offsets from the object start.
    pub bytes: Range<usize>,
}

/// Size and reference layout of one object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyDescriptor {
    kind: InstanceKind,
    size: usize,
    ranges: SmallVec<[BodyRange; 1]>,
}

impl BodyDescriptor {
    /// Describe `object`. Returns `None` if its header is not a valid kind.
    pub fn of(heap: &Heap, object: ObjectRef) -> Option<Self> {
        let header = heap.header(object);
        let kind = header.kind()?;
        let count = || decode_count(heap.word(object.slot(1)).load(Ordering::Acquire));
        let descriptor = match kind {
            InstanceKind::Filler => {
                let words = header.filler_words()? as usize;
                Self::opaque(kind, words * TAGGED_SIZE)
            }
            InstanceKind::FixedArray => Self::tagged::<FixedArrayShape>(SlotKind::Strong, count()),
            InstanceKind::ArrayList => Self::tagged::<ArrayListShape>(SlotKind::Strong, count()),
            InstanceKind::WeakFixedArray => {
                Self::tagged::<WeakFixedArrayShape>(SlotKind::MaybeWeak, count())
            }
            InstanceKind::WeakArrayList => {
                Self::tagged::<WeakArrayListShape>(SlotKind::MaybeWeak, count())
            }
            InstanceKind::ByteArray => Self::opaque(kind, ByteArrayShape::size_for(count())),
            InstanceKind::FixedDoubleArray => {
                Self::opaque(kind, FixedDoubleArrayShape::size_for(count()))
            }
            InstanceKind::ExternalPointerArray => {
                let length = count();
                let start = ExternalPointerArrayShape::HEADER_SIZE;
                let end = ExternalPointerArrayShape::offset_of_element_at(length);
                Self {
                    kind,
                    size: ExternalPointerArrayShape::size_for(length),
                    ranges: smallvec::smallvec![BodyRange {
                        kind: SlotKind::ExternalPointer,
                        bytes: start..end,
                    }],
                }
            }
        };
        Some(descriptor)
    }

    fn opaque(kind: InstanceKind, size: usize) -> Self {
        Self {
            kind,
            size,
            ranges: SmallVec::new(),
        }
    }

    /// Tagged slots span the whole body after the header.
    fn tagged<S: Shape>(slots: SlotKind, capacity: usize) -> Self {
        let size = S::size_for(capacity);
        Self {
            kind: S::KIND,
            size,
            ranges: smallvec::smallvec![BodyRange {
                kind: slots,
                bytes: S::HEADER_SIZE..size,
            }],
        }
    }

    /// The object's kind.
    pub fn kind(&self) -> InstanceKind {
        self.kind
    }

    /// Allocated size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reference-bearing ranges, in address order.
    pub fn ranges(&self) -> &[BodyRange] {
        &self.ranges
    }

    /// Visit every tagged slot of `object` with an acquire load.
    pub fn iterate_pointers(
        &self,
        heap: &Heap,
        object: ObjectRef,
        mut visit: impl FnMut(SlotAddress, SlotKind, Tagged),
    ) {
        for range in self.ranges.iter().filter(|r| r.kind != SlotKind::ExternalPointer) {
            for offset in range.bytes.clone().step_by(TAGGED_SIZE) {
                let slot = object.slot((offset / TAGGED_SIZE) as u32);
                let value = Tagged::from_bits(heap.word(slot).load(Ordering::Acquire));
                visit(slot, range.kind, value);
            }
        }
    }

    /// Visit every non-null external pointer handle of `object`.
    pub fn iterate_external_pointers(
        &self,
        heap: &Heap,
        object: ObjectRef,
        mut visit: impl FnMut(usize, PointerHandle),
    ) {
        const HANDLE_SIZE: usize = 4;
        for range in self.ranges.iter().filter(|r| r.kind == SlotKind::ExternalPointer) {
            for (index, offset) in range.bytes.clone().step_by(HANDLE_SIZE).enumerate() {
                let word = heap
                    .word(object.slot((offset / TAGGED_SIZE) as u32))
                    .load(Ordering::Acquire);
                let handle = PointerHandle((word >> ((offset % TAGGED_SIZE) * 8)) as u32);
                if !handle.is_null() {
                    visit(index, handle);
                }
            }
        }
    }
}
