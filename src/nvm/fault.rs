// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Power-failure injection.
//!
//! [`PowerFault`] wraps a store and cuts power after a given number of
//! durable writes. The failing write does not land, and every write after it
//! fails until [`PowerFault::reboot`] restores power. Reads keep working so a
//! caller can inspect what survived.

use super::{BulkProgram, DurableStore};
use crate::error::{KernelError, Result};
use crate::types::id::Addr;

pub struct PowerFault<S> {
    inner: S,
    budget: Option<u64>,
    powered: bool,
    attempts: u64,
}

impl<S: DurableStore> PowerFault<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            budget: None,
            powered: true,
            attempts: 0,
        }
    }

    /// Lose power when the `writes`-th write from now is attempted
    /// (`0` fails the very next write).
    pub fn fail_after(&mut self, writes: u64) {
        self.budget = Some(writes);
    }

    /// Restore power and disarm the fault.
    pub fn reboot(&mut self) {
        self.budget = None;
        self.powered = true;
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Writes attempted through this wrapper, landed or not.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn consume(&mut self) -> Result<()> {
        self.attempts += 1;
        if !self.powered {
            return Err(KernelError::PowerLoss);
        }
        match self.budget {
            Some(0) => {
                self.powered = false;
                Err(KernelError::PowerLoss)
            }
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<S: DurableStore> DurableStore for PowerFault<S> {
    fn capacity_words(&self) -> usize {
        self.inner.capacity_words()
    }

    fn read_word(&self, addr: Addr) -> u32 {
        self.inner.read_word(addr)
    }

    fn write_word(&mut self, addr: Addr, value: u32) -> Result<()> {
        self.consume()?;
        self.inner.write_word(addr, value)
    }
}

impl<S: BulkProgram> BulkProgram for PowerFault<S> {
    fn program_block(&mut self, dest: Addr, words: &[u32]) -> Result<()> {
        // Word by word so a fault can tear the block.
        for (i, &word) in words.iter().enumerate() {
            self.consume()?;
            self.inner.write_word(dest.offset(i as u32), word)?;
        }
        Ok(())
    }
}
