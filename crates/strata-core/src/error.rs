//! Error types for the Strata heap array layer.
//!
//! Everything that can go wrong at runtime and is reported to the caller
//! lives in [`ArrayError`]. Caller contract violations that are not checked
//! (skipping a barrier for a reference, relying on indices after
//! compaction) have no variant here.

use std::error::Error;
use std::fmt;

use crate::id::{PointerHandle, PointerTag};

/// Errors from array allocation and access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// The heap could not supply the requested memory.
    AllocationFailure {
        /// Number of bytes requested.
        requested_bytes: usize,
        /// Bytes still available in the heap's segment budget.
        available_bytes: usize,
    },
    /// The requested capacity exceeds the array kind's maximum.
    LengthExceedsMaximum {
        /// Requested capacity or length, in elements.
        requested: usize,
        /// Maximum for this array kind, in elements.
        max: usize,
    },
    /// An index or range fell outside the array's bounds.
    OutOfBounds {
        /// The offending index (or range end).
        index: usize,
        /// The exclusive upper bound.
        bound: usize,
    },
    /// An indirect pointer slot was read before anything was written to it.
    EmptySlot {
        /// Index of the empty slot.
        index: usize,
    },
    /// An external pointer was read with a tag other than the one it was
    /// written with.
    TagMismatch {
        /// The tag presented by the reader.
        expected: PointerTag,
        /// The tag stored in the table entry.
        found: PointerTag,
    },
    /// An external pointer table handle does not name a live entry.
    InvalidHandle {
        /// The offending handle.
        handle: PointerHandle,
    },
    /// The external pointer table has no free entries.
    PointerTableFull {
        /// Total number of entries in the table.
        capacity: usize,
    },
    /// An address does not fit the encoding of the slot it was stored into.
    AddressOutOfRange {
        /// The rejected address.
        address: u64,
        /// Largest address the slot can hold.
        max: u64,
    },
    /// A caller-supplied buffer does not match the requested element count.
    BufferMismatch {
        /// Number of elements the operation needs.
        needed: usize,
        /// Number of elements the buffer holds.
        provided: usize,
    },
    /// A heap configuration value was rejected at construction.
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

impl ArrayError {
    /// Whether this error belongs to the allocation failure class.
    ///
    /// Both heap exhaustion and over-maximum requests are reported to
    /// callers as allocation failures; neither is ever silently truncated.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailure { .. } | Self::LengthExceedsMaximum { .. }
        )
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure {
                requested_bytes,
                available_bytes,
            } => {
                write!(
                    f,
                    "allocation failure: requested {requested_bytes} bytes, {available_bytes} bytes available"
                )
            }
            Self::LengthExceedsMaximum { requested, max } => {
                write!(f, "length {requested} exceeds maximum {max}")
            }
            Self::OutOfBounds { index, bound } => {
                write!(f, "index {index} out of bounds (bound {bound})")
            }
            Self::EmptySlot { index } => write!(f, "slot {index} is empty"),
            Self::TagMismatch { expected, found } => {
                write!(f, "pointer tag mismatch: expected {expected}, found {found}")
            }
            Self::InvalidHandle { handle } => {
                write!(f, "pointer table handle {handle} is not live")
            }
            Self::PointerTableFull { capacity } => {
                write!(f, "pointer table full ({capacity} entries)")
            }
            Self::AddressOutOfRange { address, max } => {
                write!(f, "address {address:#x} out of range (max {max:#x})")
            }
            Self::BufferMismatch { needed, provided } => {
                write!(f, "buffer holds {provided} elements, {needed} needed")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
        }
    }
}

impl Error for ArrayError {}
