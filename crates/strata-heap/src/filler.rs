//! Filler objects over freed memory.

use std::sync::atomic::Ordering;

use strata_core::SlotAddress;

use crate::header::HeaderWord;
use crate::heap::Heap;

/// Value written over freed body words when zapping is enabled.
///
/// The low bit is clear, so a scanner that reads it as a tagged slot sees a
/// small integer and never a reference.
pub const ZAP_VALUE: u64 = 0x1bad_beef_1bad_bee0;

/// Cover `words` words starting at `start` with a filler.
///
/// The body is zapped first (if configured) and the header is published
/// last with release ordering, so a walker that observes the filler header
/// also observes the zapped body.
pub(crate) fn install_filler(heap: &Heap, start: SlotAddress, words: u32) {
    debug_assert!(words > 0);
    if heap.config().zap_freed_memory {
        for i in 1..words {
            heap.word(start.add(i)).store(ZAP_VALUE, Ordering::Relaxed);
        }
    }
    heap.word(start)
        .store(HeaderWord::filler(words).to_bits(), Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeapConfig;
    use crate::header::InstanceKind;
    use strata_core::{AllocationType, ObjectRef, Tagged, TAGGED_SIZE};

    #[test]
    fn filler_covers_region_and_zaps_body() {
        let heap = Heap::new(HeapConfig::small()).unwrap();
        let obj = heap.allocate_raw(6 * TAGGED_SIZE, AllocationType::Young).unwrap();
        for i in 1..6 {
            heap.word(obj.slot(i)).store(Tagged::strong(obj).to_bits(), Ordering::Relaxed);
        }
        install_filler(&heap, obj.slot(2), 4);
        let header = heap.header(ObjectRef::new(obj.segment(), obj.offset() + 2));
        assert_eq!(header.kind(), Some(InstanceKind::Filler));
        assert_eq!(header.filler_words(), Some(4));
        for i in 3..6 {
            let word = Tagged::from_bits(heap.word(obj.slot(i)).load(Ordering::Acquire));
            assert!(word.is_smi(), "slot {i} still holds {word}");
        }
        // Words before the filler are untouched.
        let kept = Tagged::from_bits(heap.word(obj.slot(1)).load(Ordering::Acquire));
        assert!(kept.is_strong());
    }

    #[test]
    fn zapping_can_be_disabled() {
        let config = HeapConfig {
            zap_freed_memory: false,
            ..HeapConfig::small()
        };
        let heap = Heap::new(config).unwrap();
        let obj = heap.allocate_raw(3 * TAGGED_SIZE, AllocationType::Young).unwrap();
        heap.word(obj.slot(2)).store(42, Ordering::Relaxed);
        install_filler(&heap, obj.slot(1), 2);
        assert_eq!(heap.word(obj.slot(2)).load(Ordering::Relaxed), 42);
    }
}
