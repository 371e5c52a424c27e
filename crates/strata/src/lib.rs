//! Strata: the array object model of a garbage-collected heap.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let heap = Heap::new(HeapConfig::default()).unwrap();
//!
//! // A growable list of small integers.
//! let mut list = ArrayList::new(&heap, 2, AllocationType::Young).unwrap();
//! for i in 0..5 {
//!     list.add(Tagged::smi(i)).unwrap();
//! }
//! assert_eq!(list.length(), 5);
//!
//! // Weak references are cleared by the collector, then compacted away.
//! let target = FixedArray::new(&heap, 1, AllocationType::Young).unwrap();
//! let mut weak = WeakArrayList::new(&heap, 1, AllocationType::Old).unwrap();
//! weak.add_to_end(Tagged::weak(target.object())).unwrap();
//! weak.add_to_end(Tagged::smi(7)).unwrap();
//! heap.clear_weak_slot(weak.slot_address(0));
//! weak.compact();
//! assert_eq!(weak.length(), 1);
//! assert_eq!(weak.get(0, AccessOrder::Relaxed), Tagged::smi(7));
//!
//! heap.verify().unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | Tagged words, addresses, access modes, errors, collaborator traits |
//! | [`heap`] | `strata-heap` | Heap, array kinds, body descriptors, walker, verifier |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary (`strata-core`).
///
/// Contains the tagged word encoding ([`types::Tagged`]), addresses,
/// memory-ordering and barrier selectors, [`types::ArrayError`], and the
/// collaborator traits [`types::WriteBarrier`] and
/// [`types::ExternalPointerTable`].
pub use strata_core as types;

/// The heap and its array kinds (`strata-heap`).
///
/// Tagged arrays ([`heap::FixedArray`], [`heap::WeakArrayList`], ...),
/// primitive arrays ([`heap::ByteArray`], [`heap::FixedDoubleArray`], ...),
/// and the collector-facing [`heap::BodyDescriptor`], [`heap::HeapWalker`]
/// and [`heap::HeapVerifier`].
pub use strata_heap as heap;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core vocabulary
    pub use strata_core::{
        AccessOrder, AllocationType, ArrayError, BarrierMode, ObjectRef, PointerHandle,
        PointerTag, SlotAddress, Tagged, WeakSlot,
    };

    // Collaborators
    pub use strata_core::{ExternalPointerTable, NoBarrier, WriteBarrier};

    // Heap
    pub use strata_heap::{Heap, HeapConfig, PointerTable, Space};

    // Tagged arrays
    pub use strata_heap::{ArrayList, FixedArray, WeakArrayList, WeakFixedArray};

    // Primitive arrays
    pub use strata_heap::{
        ByteArray, ExternalPointerArray, FixedDoubleArray, FixedIntegerArray, PodArray,
    };
}
