//! Linear heap walking.
//!
//! [`HeapWalker`] visits every object of every segment in address order,
//! stepping by the size its [`BodyDescriptor`] reports. It relies on the
//! heap being parseable at all times: allocation installs a filler before
//! publishing the segment top, and right-trim installs a filler before
//! publishing the smaller capacity.

use std::sync::atomic::Ordering;

use strata_core::{ObjectRef, SlotAddress, Tagged, TAGGED_SIZE};

use crate::body::{BodyDescriptor, SlotKind};
use crate::header::InstanceKind;
use crate::heap::Heap;

/// One object reached by a walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapObject {
    /// Address of the object's header.
    pub object: ObjectRef,
    /// Layout of the object.
    pub body: BodyDescriptor,
}

impl HeapObject {
    /// The object's kind.
    pub fn kind(&self) -> InstanceKind {
        self.body.kind()
    }

    /// Whether this is free space.
    pub fn is_filler(&self) -> bool {
        self.body.kind() == InstanceKind::Filler
    }
}

/// Iterator over all objects in a heap, fillers included.
///
/// Yields `Err(address)` once and stops if it meets a header that does not
/// decode, or an object that runs past its segment's top.
pub struct HeapWalker<'h> {
    heap: &'h Heap,
    segment: u32,
    offset: u32,
    done: bool,
}

impl<'h> HeapWalker<'h> {
    /// Start a walk at the first word of segment 0.
    pub fn new(heap: &'h Heap) -> Self {
        Self {
            heap,
            segment: 0,
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for HeapWalker<'_> {
    type Item = Result<HeapObject, ObjectRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(segment) = self.heap.segment(self.segment) else {
                self.done = true;
                return None;
            };
            if self.offset >= segment.top() {
                self.segment += 1;
                self.offset = 0;
                continue;
            }
            let object = ObjectRef::new(self.segment, self.offset);
            let body = BodyDescriptor::of(self.heap, object);
            let words = body.as_ref().map_or(0, |b| (b.size() / TAGGED_SIZE) as u32);
            let end = self.offset.checked_add(words);
            match (body, end) {
                (Some(body), Some(end)) if words > 0 && end <= segment.top() => {
                    self.offset = end;
                    return Some(Ok(HeapObject { object, body }));
                }
                _ => {
                    self.done = true;
                    return Some(Err(object));
                }
            }
        }
    }
}

impl Heap {
    /// Iterate over every object in the heap, fillers included.
    pub fn walk(&self) -> HeapWalker<'_> {
        HeapWalker::new(self)
    }

    /// Call `visit` for each non-filler object. Stops at the first
    /// unparseable address and returns it.
    pub fn walk_objects(&self, mut visit: impl FnMut(&HeapObject)) -> Result<(), ObjectRef> {
        for item in self.walk() {
            let object = item?;
            if !object.is_filler() {
                visit(&object);
            }
        }
        Ok(())
    }

    /// Call `visit` for every tagged slot of every object.
    pub fn visit_pointers(
        &self,
        mut visit: impl FnMut(ObjectRef, SlotAddress, SlotKind, Tagged),
    ) -> Result<(), ObjectRef> {
        self.walk_objects(|o| {
            o.body
                .iterate_pointers(self, o.object, |slot, kind, value| visit(o.object, slot, kind, value));
        })
    }

    /// Whether any tagged slot anywhere holds a strong or weak reference to
    /// `target`.
    pub fn is_referenced(&self, target: ObjectRef) -> bool {
        let mut found = false;
        // An unparseable heap reports what was seen up to that point.
        let _ = self.visit_pointers(|_, _, _, value| {
            found |= value.to_object() == Some(target);
        });
        found
    }

    /// Load the word at `slot` with acquire ordering, as a tagged value.
    pub fn load_tagged(&self, slot: SlotAddress) -> Tagged {
        Tagged::from_bits(self.word(slot).load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_array::ByteArray;
    use crate::fixed_array::FixedArray;
    use crate::testing::{referents, test_heap};
    use crate::weak::WeakArrayList;
    use strata_core::{AccessOrder, AllocationType, BarrierMode};

    #[test]
    fn walk_sees_every_object_in_order() {
        let heap = test_heap();
        let a = FixedArray::new(&heap, 2, AllocationType::Young).unwrap();
        let b = ByteArray::new(&heap, 5, AllocationType::Young).unwrap();
        let c = WeakArrayList::new(&heap, 1, AllocationType::Old).unwrap();

        let mut seen = Vec::new();
        heap.walk_objects(|o| seen.push((o.object, o.kind()))).unwrap();
        assert!(seen.contains(&(heap.empty_fixed_array().object(), InstanceKind::FixedArray)));
        assert!(seen.contains(&(c.object(), InstanceKind::WeakArrayList)));
        let young: Vec<_> = seen
            .iter()
            .filter(|(o, _)| o.segment() == a.object().segment())
            .collect();
        assert_eq!(
            young,
            vec![
                &(a.object(), InstanceKind::FixedArray),
                &(b.object(), InstanceKind::ByteArray)
            ]
        );
    }

    #[test]
    fn walk_covers_segments_exactly() {
        let heap = test_heap();
        for n in 0..40 {
            FixedArray::new(&heap, n % 7 + 1, AllocationType::Young).unwrap();
        }
        let covered: usize = heap
            .walk()
            .map(|o| o.unwrap().body.size())
            .sum();
        assert_eq!(covered, heap.used_bytes());
    }

    #[test]
    fn trimmed_region_never_reads_as_a_reference() {
        let heap = test_heap();
        let targets = referents(&heap, 6);
        let array = FixedArray::new(&heap, 6, AllocationType::Young).unwrap();
        for (i, &t) in targets.iter().enumerate() {
            array.set(i, Tagged::strong(t), AccessOrder::Relaxed, BarrierMode::Update);
        }
        array.right_trim(2);
        for &t in &targets[..2] {
            assert!(heap.is_referenced(t));
        }
        for &t in &targets[2..] {
            assert!(!heap.is_referenced(t));
        }
        // Stale words in the tail are zapped into small integers.
        for i in 5..8 {
            let word = heap.load_tagged(array.object().slot(i));
            assert!(word.is_smi());
        }
    }

    #[test]
    fn garbage_header_stops_the_walk() {
        let heap = test_heap();
        let array = FixedArray::new(&heap, 1, AllocationType::Young).unwrap();
        heap.word(array.object().slot(0)).store(0xff, Ordering::Release);
        let result = heap.walk_objects(|_| {});
        assert_eq!(result, Err(array.object()));
        assert!(heap.walk().last().unwrap().is_err());
    }
}
