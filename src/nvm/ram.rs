// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Simulated NVM held in RAM.

use super::{BulkProgram, DurableStore};
use crate::error::Result;
use crate::types::id::Addr;

/// Erased NVM pattern.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

pub struct RamStore<const WORDS: usize> {
    pub(crate) words: [u32; WORDS],
    writes: u64,
}

impl<const WORDS: usize> RamStore<WORDS> {
    /// Fresh, erased memory (every word `0xFFFF_FFFF`).
    pub fn new() -> Self {
        Self {
            words: [ERASED_WORD; WORDS],
            writes: 0,
        }
    }

    /// Memory holding arbitrary garbage, as NVM does before first boot.
    /// Deterministic for a given seed.
    pub fn with_garbage(seed: u64) -> Self {
        // splitmix64 finalizer, so neighbouring seeds start far apart.
        let mut state = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        state = (state ^ (state >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        state = (state ^ (state >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        state ^= state >> 31;
        if state == 0 {
            state = 0x2545_F491_4F6C_DD1D;
        }
        let mut store = Self::new();
        for word in store.words.iter_mut() {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *word = (state >> 32) as u32;
        }
        store
    }

    pub fn from_words(words: [u32; WORDS]) -> Self {
        Self { words, writes: 0 }
    }

    pub fn as_words(&self) -> &[u32] {
        &self.words
    }

    /// Total number of durable word writes that landed.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl<const WORDS: usize> Default for RamStore<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> DurableStore for RamStore<WORDS> {
    fn capacity_words(&self) -> usize {
        WORDS
    }

    fn read_word(&self, addr: Addr) -> u32 {
        self.words[addr.0 as usize]
    }

    fn write_word(&mut self, addr: Addr, value: u32) -> Result<()> {
        self.words[addr.0 as usize] = value;
        self.writes += 1;
        Ok(())
    }
}

impl<const WORDS: usize> BulkProgram for RamStore<WORDS> {
    fn program_block(&mut self, dest: Addr, words: &[u32]) -> Result<()> {
        let start = dest.0 as usize;
        self.words[start..start + words.len()].copy_from_slice(words);
        self.writes += words.len() as u64;
        Ok(())
    }
}
