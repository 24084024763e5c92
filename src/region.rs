// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Word ranges of a durable store and the copy/compare/fill operations
//! every buffer-level algorithm is built from.
//!
//! All writes are diff-checked: a word that already holds the target value
//! is skipped. That makes every operation here idempotent and restartable
//! from the beginning after an interruption.

use crate::error::{KernelError, Result};
use crate::nvm::DurableStore;
use crate::types::id::Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub base: Addr,
    pub words: u32,
}

impl Region {
    pub const fn new(base: Addr, words: u32) -> Self {
        Self { base, words }
    }

    pub fn addr(&self, offset: u32) -> Addr {
        self.base.offset(offset)
    }

    pub fn contains(&self, addr: Addr) -> bool {
        addr.0 >= self.base.0 && addr.0 < self.base.0 + self.words
    }

    /// Offset of `addr` inside the region.
    pub fn offset_of(&self, addr: Addr) -> Option<u32> {
        self.contains(addr).then(|| addr.0 - self.base.0)
    }

    /// Sub-range `[offset, offset + words)`, clipped to the region.
    pub fn slice(&self, offset: u32, words: u32) -> Region {
        let start = offset.min(self.words);
        let len = words.min(self.words - start);
        Region::new(self.base.offset(start), len)
    }

    pub fn iter(&self) -> impl Iterator<Item = Addr> {
        let base = self.base;
        (0..self.words).map(move |i| base.offset(i))
    }
}

/// Copies `src` over `dst`, writing only differing words.
/// Returns the number of durable writes.
pub fn copy_diff<S: DurableStore + ?Sized>(store: &mut S, src: Region, dst: Region) -> Result<usize> {
    if src.words != dst.words {
        return Err(KernelError::RegionMismatch);
    }
    let mut writes = 0;
    for (s, d) in src.iter().zip(dst.iter()) {
        let value = store.read_word(s);
        if store.write_if_changed(d, value)? {
            writes += 1;
        }
    }
    Ok(writes)
}

/// Fills `dst` with `value`, writing only differing words.
pub fn fill<S: DurableStore + ?Sized>(store: &mut S, dst: Region, value: u32) -> Result<usize> {
    let mut writes = 0;
    for addr in dst.iter() {
        if store.write_if_changed(addr, value)? {
            writes += 1;
        }
    }
    Ok(writes)
}

/// Word-by-word equality of two same-length regions.
pub fn equal<S: DurableStore + ?Sized>(store: &S, a: Region, b: Region) -> bool {
    a.words == b.words
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| store.read_word(x) == store.read_word(y))
}

/// First offset at which two regions differ.
pub fn first_difference<S: DurableStore + ?Sized>(store: &S, a: Region, b: Region) -> Option<u32> {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| store.read_word(x) != store.read_word(y))
        .map(|i| i as u32)
}
