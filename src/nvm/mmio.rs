// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Memory-mapped NVM window (MRAM/FRAM on the target).
//!
//! Aligned 32-bit stores to these parts are single-beat bus writes, which is
//! what makes them atomic with respect to power loss.

use core::ptr::NonNull;
use core::sync::atomic::{compiler_fence, Ordering};

use super::{BulkProgram, DurableStore};
use crate::error::{KernelError, Result};
use crate::types::id::Addr;

pub struct MmioStore {
    base: NonNull<u32>,
    words: usize,
}

impl MmioStore {
    /// # Safety
    /// `base` must point to `words` consecutive, 4-byte aligned words of
    /// memory that stay valid and are not accessed through any other path
    /// for the lifetime of the store.
    pub unsafe fn new(base: NonNull<u32>, words: usize) -> Self {
        Self { base, words }
    }
}

impl DurableStore for MmioStore {
    fn capacity_words(&self) -> usize {
        self.words
    }

    fn read_word(&self, addr: Addr) -> u32 {
        debug_assert!((addr.0 as usize) < self.words);
        // SAFETY: callers stay within `capacity_words`, which the layout
        // check enforces before any access.
        unsafe { core::ptr::read_volatile(self.base.as_ptr().add(addr.0 as usize)) }
    }

    fn write_word(&mut self, addr: Addr, value: u32) -> Result<()> {
        if addr.0 as usize >= self.words {
            return Err(KernelError::StoreTooSmall {
                required: addr.0 as usize + 1,
                available: self.words,
            });
        }
        // Earlier protocol writes must reach the bus before this one.
        compiler_fence(Ordering::SeqCst);
        // SAFETY: bounds checked above.
        unsafe { core::ptr::write_volatile(self.base.as_ptr().add(addr.0 as usize), value) };
        compiler_fence(Ordering::SeqCst);
        Ok(())
    }
}

impl BulkProgram for MmioStore {
    fn program_block(&mut self, dest: Addr, words: &[u32]) -> Result<()> {
        for (i, &word) in words.iter().enumerate() {
            self.write_word(dest.offset(i as u32), word)?;
        }
        Ok(())
    }
}
