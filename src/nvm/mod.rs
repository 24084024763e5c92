// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Durable word store.
//!
//! Every mutation of persistent state goes through [`DurableStore::write_word`].
//! Implementations must make that write atomic and durable at word
//! granularity: after a power failure either the old or the new word is
//! observed, never a mix.

use crate::config::BULK_ALIGN_WORDS;
use crate::error::{KernelError, Result};
use crate::types::id::Addr;

pub mod fault;
pub mod mmio;
pub mod ram;

pub use fault::PowerFault;
pub use mmio::MmioStore;
pub use ram::RamStore;

pub trait DurableStore {
    /// Number of addressable words.
    fn capacity_words(&self) -> usize;

    /// Reads one word. `addr` comes from a validated layout.
    fn read_word(&self, addr: Addr) -> u32;

    /// Atomically and durably writes one word.
    fn write_word(&mut self, addr: Addr, value: u32) -> Result<()>;

    /// Writes `value` only if it differs from the stored word.
    /// Returns whether a durable write happened.
    fn write_if_changed(&mut self, addr: Addr, value: u32) -> Result<bool> {
        if self.read_word(addr) == value {
            return Ok(false);
        }
        self.write_word(addr, value)?;
        Ok(true)
    }
}

/// Block programming primitive. Not atomic as a whole; only used for
/// bulk transfers outside the consistency protocol.
pub trait BulkProgram: DurableStore {
    fn program_block(&mut self, dest: Addr, words: &[u32]) -> Result<()>;
}

/// Programs `words` at `dest` after checking the 16-byte start alignment.
pub fn program_aligned<S: BulkProgram + ?Sized>(store: &mut S, dest: Addr, words: &[u32]) -> Result<()> {
    if dest.0 % BULK_ALIGN_WORDS != 0 {
        return Err(KernelError::Misaligned(dest.0));
    }
    let end = dest.0 as usize + words.len();
    if end > store.capacity_words() {
        return Err(KernelError::StoreTooSmall {
            required: end,
            available: store.capacity_words(),
        });
    }
    store.program_block(dest, words)
}

impl<S: DurableStore + ?Sized> DurableStore for &mut S {
    fn capacity_words(&self) -> usize {
        (**self).capacity_words()
    }

    fn read_word(&self, addr: Addr) -> u32 {
        (**self).read_word(addr)
    }

    fn write_word(&mut self, addr: Addr, value: u32) -> Result<()> {
        (**self).write_word(addr, value)
    }
}
