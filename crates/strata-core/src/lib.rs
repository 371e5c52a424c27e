//! Core types and traits for the Strata heap array layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the heap, its collaborators, and their mocks:
//! strongly-typed addresses, the tagged word encoding, memory-ordering and
//! barrier-mode selectors, error types, and the collaborator traits
//! (write barrier and external pointer table).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod id;
pub mod tagged;
pub mod traits;

pub use access::{AccessOrder, AllocationType, BarrierMode};
pub use error::ArrayError;
pub use id::{ObjectRef, PointerHandle, PointerTag, SlotAddress};
pub use tagged::{Tagged, TaggedKind, WeakSlot, SMI_MAX, SMI_MIN, TAGGED_SIZE};
pub use traits::{ExternalPointerTable, NoBarrier, WriteBarrier};
