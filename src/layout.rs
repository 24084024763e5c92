// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Persisted layout.
//!
//! ```text
//! 0        signature
//! 1        index
//! 2        new_index
//! 3        need_commit
//! 4        commit_state
//! 5        curctx
//! 6        curtsk
//! 8..12    context 0 {task, need_commit, state, pad}
//! 12..16   context 1
//! 16       dirty count
//! 17       dirty overflow
//! 20..     dirty entries {src, dest, size}
//! aligned  buffer 0
//! aligned  buffer 1
//! ```
//!
//! Both buffers start on a 16-byte boundary so the bulk primitive can
//! program them.

use crate::config::{RuntimeConfig, BULK_ALIGN_WORDS, INIT_SIGNATURE};
use crate::error::{KernelError, Result};
use crate::region::Region;
use crate::types::id::Addr;

pub const SIGNATURE: Addr = Addr(0);
pub const INDEX: Addr = Addr(1);
pub const NEW_INDEX: Addr = Addr(2);
pub const NEED_COMMIT: Addr = Addr(3);
pub const COMMIT_STATE: Addr = Addr(4);
pub const CURCTX: Addr = Addr(5);
pub const CURTSK: Addr = Addr(6);

pub const CONTEXT_BASE: Addr = Addr(8);
pub const CONTEXT_WORDS: u32 = 4;
pub const CTX_TASK: u32 = 0;
pub const CTX_NEED_COMMIT: u32 = 1;
pub const CTX_STATE: u32 = 2;

pub const DIRTY_COUNT: Addr = Addr(16);
pub const DIRTY_OVERFLOW: Addr = Addr(17);
pub const DIRTY_ENTRIES: Addr = Addr(20);
pub const DIRTY_ENTRY_WORDS: u32 = 3;

const fn align_up(words: u32) -> Option<u32> {
    match words.checked_add(BULK_ALIGN_WORDS - 1) {
        Some(w) => Some(w / BULK_ALIGN_WORDS * BULK_ALIGN_WORDS),
        None => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    crit_words: u32,
    dirty_capacity: u32,
    buffers: [Region; 2],
    total_words: u32,
}

impl Layout {
    pub fn new(crit_words: u32, dirty_capacity: u32) -> Result<Self> {
        if crit_words == 0 {
            return Err(KernelError::InvalidOperation);
        }
        let dirty_end = dirty_capacity
            .checked_mul(DIRTY_ENTRY_WORDS)
            .and_then(|w| w.checked_add(DIRTY_ENTRIES.0))
            .ok_or(KernelError::CapacityExceeded)?;
        let buffer0 = align_up(dirty_end).ok_or(KernelError::CapacityExceeded)?;
        let buffer1 = buffer0
            .checked_add(crit_words)
            .and_then(align_up)
            .ok_or(KernelError::CapacityExceeded)?;
        let total_words = buffer1
            .checked_add(crit_words)
            .ok_or(KernelError::CapacityExceeded)?;
        Ok(Self {
            crit_words,
            dirty_capacity,
            buffers: [
                Region::new(Addr(buffer0), crit_words),
                Region::new(Addr(buffer1), crit_words),
            ],
            total_words,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::new(config.crit_words, config.dirty_capacity)
    }

    pub fn crit_words(&self) -> u32 {
        self.crit_words
    }

    pub fn dirty_capacity(&self) -> u32 {
        self.dirty_capacity
    }

    /// Words a store must provide to hold this layout.
    pub fn words_required(&self) -> usize {
        self.total_words as usize
    }

    pub fn buffer(&self, which: u32) -> Region {
        self.buffers[(which & 1) as usize]
    }

    pub fn context(&self, slot: u32) -> Addr {
        CONTEXT_BASE.offset((slot & 1) * CONTEXT_WORDS)
    }

    pub fn dirty_entry(&self, i: u32) -> Addr {
        DIRTY_ENTRIES.offset(i * DIRTY_ENTRY_WORDS)
    }

    /// Signature stamped on cold start. A firmware whose persisted layout
    /// differs reads a mismatch and re-initializes.
    pub fn signature(&self) -> u32 {
        let fingerprint = self.crit_words.rotate_left(16) ^ self.dirty_capacity;
        INIT_SIGNATURE ^ fingerprint.wrapping_mul(0x9E37_79B9)
    }

    /// Checks that `available` words can hold the layout.
    pub fn check_fits(&self, available: usize) -> Result<()> {
        if available < self.words_required() {
            return Err(KernelError::StoreTooSmall {
                required: self.words_required(),
                available,
            });
        }
        Ok(())
    }
}
