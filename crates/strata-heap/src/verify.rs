//! Whole-heap consistency checks.
//!
//! [`HeapVerifier`] walks the heap once to index every object start, then
//! checks each object against the layout rules the array kinds maintain.
//! It is a debugging aid for tests and for collectors under development;
//! nothing on the allocation or access paths calls it.

use std::error::Error;
use std::fmt;
use std::sync::atomic::Ordering;

use indexmap::IndexMap;
use strata_core::{ObjectRef, SlotAddress, Tagged};

use crate::body::{BodyDescriptor, SlotKind};
use crate::header::InstanceKind;
use crate::heap::Heap;
use crate::shape::{decode_count, ArrayListShape, Shape, WeakArrayListShape};

/// A violated heap invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyIssue {
    /// The walk met a header it could not decode.
    Unparseable {
        /// Address of the bad header.
        at: ObjectRef,
    },
    /// A tagged slot refers to something that is not an object start.
    DanglingReference {
        /// Object holding the slot.
        host: ObjectRef,
        /// The slot.
        slot: SlotAddress,
        /// The referenced address.
        target: ObjectRef,
    },
    /// A strong-only array holds a weak reference or the cleared sentinel.
    UnexpectedWeak {
        /// Object holding the slot.
        host: ObjectRef,
        /// The slot.
        slot: SlotAddress,
    },
    /// A list's length exceeds its capacity.
    LengthExceedsCapacity {
        /// The list.
        host: ObjectRef,
        /// Stored length.
        length: usize,
        /// Stored capacity.
        capacity: usize,
    },
    /// A list slot past the length holds something other than the hole.
    StaleTail {
        /// The list.
        host: ObjectRef,
        /// Index of the slot.
        index: usize,
        /// The value found.
        value: Tagged,
    },
}

impl fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable { at } => write!(f, "unparseable header at {at}"),
            Self::DanglingReference { host, slot, target } => {
                write!(f, "slot {slot} of {host} refers to {target}, which is not an object")
            }
            Self::UnexpectedWeak { host, slot } => {
                write!(f, "strong-only array {host} holds a weak value in slot {slot}")
            }
            Self::LengthExceedsCapacity {
                host,
                length,
                capacity,
            } => write!(f, "list {host} has length {length} over capacity {capacity}"),
            Self::StaleTail { host, index, value } => {
                write!(f, "list {host} holds {value} past its length at index {index}")
            }
        }
    }
}

impl Error for VerifyIssue {}

/// An index of every object in a heap, built by one walk.
pub struct HeapVerifier<'h> {
    heap: &'h Heap,
    objects: IndexMap<ObjectRef, BodyDescriptor>,
}

impl<'h> HeapVerifier<'h> {
    /// Walk `heap` and index its objects. Fails if the heap does not parse.
    pub fn new(heap: &'h Heap) -> Result<Self, VerifyIssue> {
        let mut objects = IndexMap::new();
        heap.walk_objects(|o| {
            objects.insert(o.object, o.body.clone());
        })
        .map_err(|at| VerifyIssue::Unparseable { at })?;
        Ok(Self { heap, objects })
    }

    /// Number of non-filler objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of objects of `kind`.
    pub fn count_of(&self, kind: InstanceKind) -> usize {
        self.objects.values().filter(|b| b.kind() == kind).count()
    }

    /// Whether `object` is the start of a live (non-filler) object.
    pub fn contains(&self, object: ObjectRef) -> bool {
        self.objects.contains_key(&object)
    }

    /// Check every indexed object, returning all issues in address order.
    pub fn verify(&self) -> Vec<VerifyIssue> {
        let mut issues = Vec::new();
        for (&host, body) in &self.objects {
            body.iterate_pointers(self.heap, host, |slot, kind, value| {
                if kind == SlotKind::Strong && (value.is_weak() || value.is_cleared()) {
                    issues.push(VerifyIssue::UnexpectedWeak { host, slot });
                }
                if let Some(target) = value.to_object() {
                    if !self.contains(target) {
                        issues.push(VerifyIssue::DanglingReference { host, slot, target });
                    }
                }
            });
            match body.kind() {
                InstanceKind::ArrayList => self.verify_list::<ArrayListShape>(host, &mut issues),
                InstanceKind::WeakArrayList => {
                    self.verify_list::<WeakArrayListShape>(host, &mut issues)
                }
                _ => {}
            }
        }
        issues
    }

    fn verify_list<S: Shape>(&self, host: ObjectRef, issues: &mut Vec<VerifyIssue>) {
        let load = |word: u32| self.heap.word(host.slot(word)).load(Ordering::Acquire);
        let capacity = decode_count(load(S::CAPACITY_WORD));
        let length = decode_count(load(S::LENGTH_WORD));
        if length > capacity {
            issues.push(VerifyIssue::LengthExceedsCapacity {
                host,
                length,
                capacity,
            });
            return;
        }
        for index in length..capacity {
            let value = Tagged::from_bits(load(S::HEADER_WORDS + index as u32));
            if !value.is_empty() {
                issues.push(VerifyIssue::StaleTail { host, index, value });
            }
        }
    }
}

impl Heap {
    /// Walk and check the whole heap.
    pub fn verify(&self) -> Result<(), Vec<VerifyIssue>> {
        let verifier = HeapVerifier::new(self).map_err(|issue| vec![issue])?;
        let issues = verifier.verify();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
