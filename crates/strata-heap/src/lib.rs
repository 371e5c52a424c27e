//! Array object model for a garbage-collected heap.
//!
//! Every array is a heap object: a header word naming its kind, a
//! Smi-encoded capacity word, an optional length word, and a body of
//! elements. The heap is a list of segments of `AtomicU64` words, so every
//! access is an atomic load or store and this crate needs no `unsafe`.
//!
//! # Architecture
//!
//! ```text
//! Heap (segments + bump cursors + collaborators)
//! ├── Segment[] (young | old | large-object, Box<[AtomicU64]>)
//! ├── Arc<dyn WriteBarrier>          (notified on reference stores)
//! ├── Arc<dyn ExternalPointerTable>  (PointerTable by default)
//! └── canonical empty FixedArray     (old space, capacity 0)
//!
//! TaggedArray<S: TaggedShape>
//! ├── FixedArray        (strong slots, hole-aware growth)
//! ├── ArrayList         (FixedArray with a length word)
//! ├── WeakFixedArray    (slots may hold weak references)
//! └── WeakArrayList     (weak + length, compaction)
//!
//! PrimitiveArray<S: PrimitiveShape>
//! ├── ByteArray → FixedIntegerArray<T>, PodArray<T>
//! ├── FixedDoubleArray  (hole NaN)
//! └── ExternalPointerArray (32-bit table handles)
//!
//! BodyDescriptor → HeapWalker → HeapVerifier
//! ```
//!
//! # Parseability
//!
//! A walker may step through a segment at any time. Allocation installs a
//! filler over fresh space before the cursor moves, a new object publishes
//! its header with release ordering only after its capacity and body are
//! written, and right-trim turns the released tail into a filler before the
//! smaller capacity is published.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array_list;
pub mod body;
pub mod byte_array;
pub mod config;
pub mod double_array;
pub mod external;
pub mod filler;
pub mod fixed_array;
pub mod header;
pub mod heap;
pub mod pointer_table;
pub mod primitive_array;
pub mod segment;
pub mod shape;
pub mod tagged_array;
pub mod verify;
pub mod walk;
pub mod weak;

#[cfg(test)]
mod testing;

// Public re-exports for the primary API surface.
pub use array_list::ArrayList;
pub use body::{BodyDescriptor, BodyRange, SlotKind};
pub use byte_array::{
    ByteArray, FixedAddressArray, FixedInt16Array, FixedInt32Array, FixedInt64Array,
    FixedInt8Array, FixedInteger, FixedIntegerArray, FixedUInt16Array, FixedUInt32Array,
    FixedUInt64Array, FixedUInt8Array, PodArray, SANDBOXED_POINTER_SHIFT, SANDBOX_SIZE,
};
pub use config::HeapConfig;
pub use double_array::{FixedDoubleArray, HOLE_NAN_BITS};
pub use external::ExternalPointerArray;
pub use filler::ZAP_VALUE;
pub use fixed_array::FixedArray;
pub use header::{HeaderWord, InstanceKind};
pub use heap::Heap;
pub use pointer_table::{PointerTable, MAX_EXTERNAL_ADDRESS};
pub use primitive_array::{Primitive, PrimitiveArray};
pub use segment::{Segment, Space};
pub use shape::{
    ArrayListShape, ByteArrayShape, ExternalPointerArrayShape, FixedArrayShape,
    FixedDoubleArrayShape, PrimitiveShape, Shape, TaggedShape, WeakArrayListShape,
    WeakFixedArrayShape, MAX_SIZE,
};
pub use tagged_array::{capacity_for_length, new_capacity_for_index, TaggedArray};
pub use verify::{HeapVerifier, VerifyIssue};
pub use walk::{HeapObject, HeapWalker};
pub use weak::{WeakArrayList, WeakFixedArray};
