//! The heap: segment pool, allocator, and collaborator wiring.
//!
//! [`Heap`] owns the segments that hold every array object, hands out
//! capacity-tagged regions to the array constructors, and carries the two
//! injected collaborators (write barrier and external pointer table).
//!
//! ```text
//! Heap
//! ├── segments: [OnceLock<Segment>; max_segments]   (created lazily)
//! │   ├── young : bump-allocated, one current segment
//! │   ├── old   : bump-allocated, one current segment
//! │   └── large : one dedicated segment per large object
//! ├── Arc<dyn WriteBarrier>
//! ├── Arc<dyn ExternalPointerTable>
//! └── empty_fixed_array root (old space)
//! ```
//!
//! Allocation is serialised by a mutex; slot access never takes it. All
//! memory is reached through atomics, so the heap is `Send + Sync` and may
//! be shared with collector threads by reference.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use strata_core::{
    AllocationType, ArrayError, ExternalPointerTable, NoBarrier, ObjectRef, SlotAddress, Tagged,
    WriteBarrier, TAGGED_SIZE,
};
use tracing::{debug, warn};

use crate::config::HeapConfig;
use crate::fixed_array::FixedArray;
use crate::header::{HeaderWord, InstanceKind};
use crate::pointer_table::PointerTable;
use crate::segment::{Segment, Space};

/// Allocation cursors, guarded by the heap's allocation lock.
#[derive(Debug, Default)]
struct Cursors {
    young: Option<u32>,
    old: Option<u32>,
    /// Index of the next segment slot to hand out.
    next_segment: u32,
}

impl Cursors {
    fn current(&self, space: Space) -> Option<u32> {
        match space {
            Space::Young => self.young,
            Space::Old => self.old,
            Space::LargeObject => None,
        }
    }

    fn set_current(&mut self, space: Space, index: u32) {
        match space {
            Space::Young => self.young = Some(index),
            Space::Old => self.old = Some(index),
            Space::LargeObject => {}
        }
    }
}

/// A garbage-collected heap of array objects.
pub struct Heap {
    config: HeapConfig,
    segments: Box<[OnceLock<Segment>]>,
    /// Number of segments created. Written under the allocation lock.
    segment_count: AtomicU32,
    cursors: Mutex<Cursors>,
    barrier: Arc<dyn WriteBarrier>,
    pointer_table: Arc<dyn ExternalPointerTable>,
    empty_fixed_array: ObjectRef,
}

// Compile-time assertion: Heap must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Heap>();
};

impl Heap {
    /// Create a heap with no write barrier and a fresh [`PointerTable`].
    pub fn new(config: HeapConfig) -> Result<Self, ArrayError> {
        let table = Arc::new(PointerTable::new(config.pointer_table_capacity));
        Self::with_collaborators(config, Arc::new(NoBarrier), table)
    }

    /// Create a heap wired to the given barrier and pointer table.
    pub fn with_collaborators(
        config: HeapConfig,
        barrier: Arc<dyn WriteBarrier>,
        pointer_table: Arc<dyn ExternalPointerTable>,
    ) -> Result<Self, ArrayError> {
        config.validate()?;
        let segments = (0..config.max_segments).map(|_| OnceLock::new()).collect();
        let mut heap = Self {
            config,
            segments,
            segment_count: AtomicU32::new(0),
            cursors: Mutex::new(Cursors::default()),
            barrier,
            pointer_table,
            empty_fixed_array: ObjectRef::NULL,
        };
        heap.empty_fixed_array = FixedArray::allocate(&heap, 0, AllocationType::Old)?.object();
        Ok(heap)
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// The injected write barrier.
    pub fn barrier(&self) -> &dyn WriteBarrier {
        self.barrier.as_ref()
    }

    /// The injected external pointer table.
    pub fn pointer_table(&self) -> &dyn ExternalPointerTable {
        self.pointer_table.as_ref()
    }

    /// The canonical zero-length fixed array.
    pub fn empty_fixed_array(&self) -> FixedArray<'_> {
        FixedArray::from_object_unchecked(self, self.empty_fixed_array)
    }

    /// Allocate `size_bytes` (a multiple of [`TAGGED_SIZE`]) for a new object.
    ///
    /// The returned region is zeroed and covered by a filler; the caller
    /// initialises its fields and then publishes the real header with
    /// release ordering.
    pub(crate) fn allocate_raw(
        &self,
        size_bytes: usize,
        allocation: AllocationType,
    ) -> Result<ObjectRef, ArrayError> {
        debug_assert_eq!(size_bytes % TAGGED_SIZE, 0);
        let words = u32::try_from(size_bytes / TAGGED_SIZE)
            .map_err(|_| self.allocation_failure(size_bytes))?;
        let mut cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);

        if words > self.config.max_regular_object_words {
            // Dedicated segment: one extra word for the reserved word 0.
            let index = self.acquire_segment(&mut cursors, words + 1, Space::LargeObject, size_bytes)?;
            debug!(segment = index, size_bytes, "allocated large object");
            return self.bump_in(index, words, size_bytes);
        }

        let space = Space::from(allocation);
        if let Some(index) = cursors.current(space) {
            if let Some(offset) = self.segment_at(index).bump(words) {
                return Ok(ObjectRef::new(index, offset));
            }
        }
        let index = self.acquire_segment(&mut cursors, self.config.segment_words, space, size_bytes)?;
        cursors.set_current(space, index);
        self.bump_in(index, words, size_bytes)
    }

    fn bump_in(&self, index: u32, words: u32, size_bytes: usize) -> Result<ObjectRef, ArrayError> {
        self.segment_at(index)
            .bump(words)
            .map(|offset| ObjectRef::new(index, offset))
            .ok_or_else(|| self.allocation_failure(size_bytes))
    }

    fn acquire_segment(
        &self,
        cursors: &mut Cursors,
        len: u32,
        space: Space,
        size_bytes: usize,
    ) -> Result<u32, ArrayError> {
        let index = cursors.next_segment;
        let Some(slot) = self.segments.get(index as usize) else {
            let err = self.allocation_failure(size_bytes);
            warn!(size_bytes, segments = index, "heap segment budget exhausted");
            return Err(err);
        };
        slot.get_or_init(|| Segment::new(len, space));
        cursors.next_segment += 1;
        self.segment_count.store(cursors.next_segment, Ordering::Release);
        debug!(segment = index, ?space, words = len, "acquired segment");
        Ok(index)
    }

    fn allocation_failure(&self, requested_bytes: usize) -> ArrayError {
        ArrayError::AllocationFailure {
            requested_bytes,
            available_bytes: self.available_bytes(),
        }
    }

    /// The segment at `index`, if it has been created.
    pub fn segment(&self, index: u32) -> Option<&Segment> {
        self.segments.get(index as usize).and_then(OnceLock::get)
    }

    fn segment_at(&self, index: u32) -> &Segment {
        match self.segment(index) {
            Some(segment) => segment,
            None => panic!("segment {index} has not been allocated"),
        }
    }

    /// Iterate over all created segments in index order.
    pub fn segments(&self) -> impl Iterator<Item = (u32, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.get().map(|s| (i as u32, s)))
    }

    /// The heap word at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` lies outside every allocated segment. Addresses
    /// handed out by this heap never do.
    #[inline]
    pub fn word(&self, slot: SlotAddress) -> &AtomicU64 {
        self.segment_at(slot.segment).word(slot.offset)
    }

    /// The header of `object`, loaded with acquire ordering.
    pub fn header(&self, object: ObjectRef) -> HeaderWord {
        HeaderWord::from_bits(self.word(object.slot(0)).load(Ordering::Acquire))
    }

    /// The instance kind of `object`.
    pub fn kind_of(&self, object: ObjectRef) -> Option<InstanceKind> {
        self.header(object).kind()
    }

    /// Whether `object` is an array of any kind.
    pub fn is_array(&self, object: ObjectRef) -> bool {
        self.kind_of(object).is_some_and(InstanceKind::is_array)
    }

    /// Whether `object` is exactly a [`FixedArray`], not one of the other
    /// tagged kinds that share its layout prefix.
    pub fn is_fixed_array_exact(&self, object: ObjectRef) -> bool {
        self.kind_of(object) == Some(InstanceKind::FixedArray)
    }

    /// Publish the header of a freshly initialised object.
    pub(crate) fn publish_header(&self, object: ObjectRef, kind: InstanceKind) {
        self.word(object.slot(0))
            .store(HeaderWord::new(kind).to_bits(), Ordering::Release);
    }

    /// The space holding `object`.
    pub fn space_of(&self, object: ObjectRef) -> Space {
        self.segment_at(object.segment()).space()
    }

    /// Overwrite a weak slot with the cleared sentinel.
    ///
    /// This is the collector's `Live -> Cleared` transition and is the only
    /// way [`Tagged::CLEARED`] enters the heap. Mutator code must not call
    /// it. Clearing runs while the mutator is paused for weak processing,
    /// so it never races with compaction of the same list.
    pub fn clear_weak_slot(&self, slot: SlotAddress) {
        let previous = Tagged::from_bits(
            self.word(slot)
                .swap(Tagged::CLEARED.to_bits(), Ordering::AcqRel),
        );
        debug_assert!(
            previous.is_weak() || previous.is_cleared(),
            "clearing non-weak slot {slot} holding {previous}"
        );
    }

    /// Number of segments created so far.
    pub fn segment_count(&self) -> usize {
        self.segment_count.load(Ordering::Acquire) as usize
    }

    /// Memory reserved by all created segments, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.segments().map(|(_, s)| s.memory_bytes()).sum()
    }

    /// Bytes handed out by the allocator, fillers included.
    pub fn used_bytes(&self) -> usize {
        self.segments()
            .map(|(_, s)| s.top() as usize * TAGGED_SIZE)
            .sum()
    }

    /// Bytes still obtainable from segments not yet created.
    pub fn available_bytes(&self) -> usize {
        let unused = (self.config.max_segments as usize).saturating_sub(self.segment_count());
        unused * self.config.segment_bytes()
    }
}
