//! Contiguous word segments with bump allocation.
//!
//! A [`Segment`] is a boxed slice of `AtomicU64` words plus a bump cursor.
//! Every word is an atomic so that collector threads can read headers and
//! slots while the mutator writes them; the ordering of each access is
//! chosen by the caller. Segments are zero-initialised at creation and are
//! never freed or reused while the heap is alive.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use strata_core::{AllocationType, TAGGED_SIZE};

use crate::header::HeaderWord;

/// Which space a segment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Space {
    /// Young generation.
    Young,
    /// Old generation.
    Old,
    /// A dedicated segment holding one large object.
    LargeObject,
}

impl Space {
    /// The allocation hint that places new objects next to objects of
    /// this space. Large objects are long-lived, so their neighbours go old.
    pub const fn allocation_type(self) -> AllocationType {
        match self {
            Space::Young => AllocationType::Young,
            Space::Old | Space::LargeObject => AllocationType::Old,
        }
    }
}

impl From<AllocationType> for Space {
    fn from(allocation: AllocationType) -> Self {
        match allocation {
            AllocationType::Young => Space::Young,
            AllocationType::Old => Space::Old,
        }
    }
}

/// A single contiguous memory segment with bump allocation.
///
/// Word 0 is a reserved one-word filler so that offset 0 never names an
/// object. The region `[0, top)` is always parseable: every allocation
/// installs a filler over its words before `top` is published.
pub struct Segment {
    /// Backing storage.
    words: Box<[AtomicU64]>,
    /// Bump pointer: next free word.
    top: AtomicU32,
    space: Space,
}

impl Segment {
    /// Create a zeroed segment of `len` words.
    pub fn new(len: u32, space: Space) -> Self {
        let words: Box<[AtomicU64]> = (0..len).map(|_| AtomicU64::new(0)).collect();
        words[0].store(HeaderWord::filler(1).to_bits(), Ordering::Relaxed);
        Self {
            words,
            top: AtomicU32::new(1),
            space,
        }
    }

    /// Bump-allocate `len` words, returning the offset of the first one.
    ///
    /// The new region is covered by a filler before `top` is released, so a
    /// concurrent walker never sees unparseable memory. Returns `None` if the
    /// segment has insufficient remaining capacity.
    ///
    /// Callers must serialise allocation on a segment; the heap does so
    /// under its allocation lock.
    pub(crate) fn bump(&self, len: u32) -> Option<u32> {
        if len == 0 {
            return None;
        }
        let offset = self.top.load(Ordering::Relaxed);
        let new_top = offset.checked_add(len)?;
        if new_top as usize > self.words.len() {
            return None;
        }
        self.words[offset as usize].store(HeaderWord::filler(len).to_bits(), Ordering::Relaxed);
        self.top.store(new_top, Ordering::Release);
        Some(offset)
    }

    /// The word at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the segment.
    #[inline]
    pub fn word(&self, offset: u32) -> &AtomicU64 {
        &self.words[offset as usize]
    }

    /// Number of words allocated so far (including the reserved word 0).
    pub fn top(&self) -> u32 {
        self.top.load(Ordering::Acquire)
    }

    /// Total capacity in words.
    pub fn capacity(&self) -> u32 {
        self.words.len() as u32
    }

    /// Remaining free capacity in words.
    pub fn remaining(&self) -> u32 {
        self.capacity() - self.top()
    }

    /// The space this segment belongs to.
    pub fn space(&self) -> Space {
        self.space
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.words.len() * TAGGED_SIZE
    }
}

// Compile-time assertion: Segment must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Segment>();
};
