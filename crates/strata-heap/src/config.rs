//! Heap configuration parameters.

use strata_core::{ArrayError, TAGGED_SIZE};

/// Configuration for the heap that backs the array layer.
///
/// Controls segment sizing, the segment budget, the large-object threshold,
/// and debugging aids. Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct HeapConfig {
    /// Size of each regular segment in 8-byte words.
    ///
    /// Default: 65_536 (512KB). Must be a power of two and at least 1024.
    pub segment_words: u32,

    /// Maximum number of segments across young, old, and large-object space.
    ///
    /// Default: 256. Each large object occupies a dedicated segment.
    pub max_segments: u16,

    /// Largest object (header included) placed in a regular segment, in
    /// words. Anything larger goes to large-object space.
    ///
    /// Default: 32_768. Must not exceed half of `segment_words`.
    pub max_regular_object_words: u32,

    /// Overwrite the body of freed regions (right-trimmed tails) with a
    /// Smi-shaped zap value so stale references cannot survive in memory.
    ///
    /// Default: `cfg!(debug_assertions)`.
    pub zap_freed_memory: bool,

    /// Number of entries in the external pointer table, including the
    /// reserved null entry.
    ///
    /// Default: 4096. Must be at least 2.
    pub pointer_table_capacity: u32,
}

impl HeapConfig {
    /// Default segment size: 512KB / 8 bytes = 64K words.
    pub const DEFAULT_SEGMENT_WORDS: u32 = 65_536;

    /// Default maximum segment count.
    pub const DEFAULT_MAX_SEGMENTS: u16 = 256;

    /// Default large-object threshold in words.
    pub const DEFAULT_MAX_REGULAR_OBJECT_WORDS: u32 = 32_768;

    /// Default external pointer table size.
    pub const DEFAULT_POINTER_TABLE_CAPACITY: u32 = 4096;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            segment_words: Self::DEFAULT_SEGMENT_WORDS,
            max_segments: Self::DEFAULT_MAX_SEGMENTS,
            max_regular_object_words: Self::DEFAULT_MAX_REGULAR_OBJECT_WORDS,
            zap_freed_memory: cfg!(debug_assertions),
            pointer_table_capacity: Self::DEFAULT_POINTER_TABLE_CAPACITY,
        }
    }

    /// A small config for tests: 1024-word segments, 64 segments,
    /// 512-word regular objects, zapping on.
    pub fn small() -> Self {
        Self {
            segment_words: 1024,
            max_segments: 64,
            max_regular_object_words: 512,
            zap_freed_memory: true,
            pointer_table_capacity: 256,
        }
    }

    /// Size of a single regular segment in bytes.
    pub fn segment_bytes(&self) -> usize {
        self.segment_words as usize * TAGGED_SIZE
    }

    /// Largest object placed in a regular segment, in bytes.
    pub fn max_regular_object_bytes(&self) -> usize {
        self.max_regular_object_words as usize * TAGGED_SIZE
    }

    /// Check every constraint documented on the fields.
    pub fn validate(&self) -> Result<(), ArrayError> {
        if !self.segment_words.is_power_of_two() || self.segment_words < 1024 {
            return Err(ArrayError::InvalidConfig {
                reason: format!(
                    "segment_words must be a power of two and >= 1024 (got {})",
                    self.segment_words,
                ),
            });
        }
        // Young and old space each need at least one segment.
        if self.max_segments < 2 {
            return Err(ArrayError::InvalidConfig {
                reason: format!("max_segments must be >= 2 (got {})", self.max_segments),
            });
        }
        if self.max_regular_object_words == 0
            || self.max_regular_object_words > self.segment_words / 2
        {
            return Err(ArrayError::InvalidConfig {
                reason: format!(
                    "max_regular_object_words must be in 1..={} (got {})",
                    self.segment_words / 2,
                    self.max_regular_object_words,
                ),
            });
        }
        if self.pointer_table_capacity < 2 {
            return Err(ArrayError::InvalidConfig {
                reason: format!(
                    "pointer_table_capacity must be >= 2 (got {})",
                    self.pointer_table_capacity,
                ),
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new()
    }
}
