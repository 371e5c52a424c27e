//! Memory-ordering, write-barrier, and allocation selectors.
//!
//! These are explicit arguments at every slot access so that the ordering
//! contract is visible at the call site rather than implied.

use std::sync::atomic::Ordering;

/// Memory ordering for a single slot load or store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessOrder {
    /// No ordering. Only valid while the array has not escaped to another
    /// thread (including the collector).
    Relaxed,
    /// Acquire on loads, release on stores. Used to publish and observe
    /// fully-initialized data.
    AcquireRelease,
    /// Sequentially consistent loads and stores.
    SeqCst,
}

impl AccessOrder {
    /// The `std` ordering to use for a load.
    pub const fn load(self) -> Ordering {
        match self {
            AccessOrder::Relaxed => Ordering::Relaxed,
            AccessOrder::AcquireRelease => Ordering::Acquire,
            AccessOrder::SeqCst => Ordering::SeqCst,
        }
    }

    /// The `std` ordering to use for a store.
    pub const fn store(self) -> Ordering {
        match self {
            AccessOrder::Relaxed => Ordering::Relaxed,
            AccessOrder::AcquireRelease => Ordering::Release,
            AccessOrder::SeqCst => Ordering::SeqCst,
        }
    }
}

/// Whether a reference store notifies the collector.
///
/// `Skip` is only valid when the stored value provably needs no
/// notification, e.g. an inline small integer or a sentinel. Skipping the
/// barrier for a heap reference is a caller contract violation that can
/// leave the collector's liveness graph stale; it is not checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BarrierMode {
    /// Do not notify the collector.
    Skip,
    /// Notify the collector for every heap reference stored.
    #[default]
    Update,
}

/// Generation hint for a new allocation.
///
/// Requests above the regular object size limit are placed in large-object
/// space regardless of the hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AllocationType {
    /// Short-lived objects, collected by the scavenger.
    #[default]
    Young,
    /// Long-lived objects.
    Old,
}
