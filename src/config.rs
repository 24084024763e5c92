// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

use crate::types::id::TaskId;

/// Cold-start signature. Mixed with the layout fingerprint before stamping.
pub const INIT_SIGNATURE: u32 = 0x5EED_C0DE;

/// Size of one durable word in bytes.
pub const WORD_BYTES: usize = 4;

/// Start-address alignment required by the bulk programming primitive.
pub const BULK_ALIGN_BYTES: usize = 16;

/// Bulk alignment expressed in words.
pub const BULK_ALIGN_WORDS: u32 = (BULK_ALIGN_BYTES / WORD_BYTES) as u32;

/// Default size of the critical-variable region in words.
pub const DEFAULT_CRIT_WORDS: u32 = 16;

/// Default number of dirty-list entries.
pub const DEFAULT_DIRTY_CAPACITY: u32 = 32;

/// Runtime configuration. Determines the persisted layout, so changing
/// `crit_words` or `dirty_capacity` forces a cold start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Words in each critical-variable buffer.
    pub crit_words: u32,
    /// Entries in the persisted dirty list.
    pub dirty_capacity: u32,
    /// Roll back only the recorded ranges instead of the whole buffer.
    pub dirty_tracking: bool,
    /// Task bound to context 0 on cold start.
    pub entry_task: TaskId,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            crit_words: DEFAULT_CRIT_WORDS,
            dirty_capacity: DEFAULT_DIRTY_CAPACITY,
            dirty_tracking: true,
            entry_task: TaskId(0),
        }
    }
}
