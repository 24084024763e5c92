// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Double-buffered state manager.
//!
//! Owns the critical-variable buffer pair and the words that say which one
//! is authoritative. `buffer[index]` is the active (committed) buffer,
//! `buffer[1 - index]` the working buffer tasks mutate.

use crate::error::Result;
use crate::layout::{Layout, COMMIT_STATE, INDEX, NEED_COMMIT, NEW_INDEX, SIGNATURE};
use crate::nvm::DurableStore;
use crate::region::{self, Region};
use crate::state::dirty::DirtyTracker;
use crate::state::phase::Phase;

#[derive(Clone, Copy, Debug)]
pub struct StateManager {
    layout: Layout,
}

impl StateManager {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // --- Read APIs ---

    pub fn is_initialized<S: DurableStore + ?Sized>(&self, store: &S) -> bool {
        store.read_word(SIGNATURE) == self.layout.signature()
    }

    pub fn index<S: DurableStore + ?Sized>(&self, store: &S) -> u32 {
        store.read_word(INDEX) & 1
    }

    pub fn new_index<S: DurableStore + ?Sized>(&self, store: &S) -> u32 {
        store.read_word(NEW_INDEX) & 1
    }

    pub fn need_commit<S: DurableStore + ?Sized>(&self, store: &S) -> bool {
        store.read_word(NEED_COMMIT) != 0
    }

    pub fn commit_state<S: DurableStore + ?Sized>(&self, store: &S) -> Phase {
        Phase::from_word(store.read_word(COMMIT_STATE))
    }

    pub fn active_region<S: DurableStore + ?Sized>(&self, store: &S) -> Region {
        self.layout.buffer(self.index(store))
    }

    pub fn working_region<S: DurableStore + ?Sized>(&self, store: &S) -> Region {
        self.layout.buffer(1 ^ self.index(store))
    }

    // --- Write Logic ---

    /// Cold-start initialization, run on every boot. A no-op once the
    /// signature is stamped. Otherwise resets the index words, zeroes both
    /// buffers, runs `format` for the records owned by other components, and
    /// stamps the signature last.
    ///
    /// Returns whether a cold initialization happened.
    pub fn initialize<S, F>(&self, store: &mut S, format: F) -> Result<bool>
    where
        S: DurableStore + ?Sized,
        F: FnOnce(&mut S) -> Result<()>,
    {
        if self.is_initialized(store) {
            return Ok(false);
        }
        tracing::debug!(signature = self.layout.signature(), "cold start, formatting NVM");

        store.write_word(NEED_COMMIT, 0)?;
        store.write_word(INDEX, 0)?;
        region::fill(store, self.layout.buffer(1), 0)?;
        region::fill(store, self.layout.buffer(0), 0)?;
        format(store)?;
        store.write_word(NEW_INDEX, 0)?;
        store.write_word(COMMIT_STATE, Phase::Ready.to_word())?;
        store.write_word(SIGNATURE, self.layout.signature())?;
        Ok(true)
    }

    pub fn need_commit_buffer<S: DurableStore + ?Sized>(&self, store: &mut S, choice: bool) -> Result<()> {
        store.write_word(NEED_COMMIT, choice as u32)
    }

    pub fn update_buffer_state<S: DurableStore + ?Sized>(&self, store: &mut S, phase: Phase) -> Result<()> {
        store.write_word(COMMIT_STATE, phase.to_word())
    }

    /// Requests a buffer swap; the next [`commit`](Self::commit) performs it.
    pub fn begin_commit<S: DurableStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        self.update_buffer_state(store, Phase::Commit1)
    }

    /// Promotes the working buffer to active.
    ///
    /// Each step is one or more single-word writes followed by a write of
    /// the next phase, and the persisted phase is re-read after every step,
    /// so an interrupted swap resumes exactly where it stopped. Re-running
    /// `Commit1` recomputes the same `new_index` because `index` has not
    /// changed yet.
    pub fn commit<S: DurableStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        loop {
            match self.commit_state(store) {
                Phase::Ready => return Ok(()),
                Phase::Commit1 => {
                    let new_index = 1 ^ self.index(store);
                    store.write_word(NEW_INDEX, new_index)?;
                    self.update_buffer_state(store, Phase::Commit2)?;
                }
                Phase::Commit2 => {
                    let new_index = self.new_index(store);
                    store.write_word(INDEX, new_index)?;
                    self.need_commit_buffer(store, false)?;
                    self.update_buffer_state(store, Phase::Ready)?;
                    tracing::debug!(index = new_index, "buffer swap committed");
                }
            }
        }
    }

    /// Discards working-buffer mutations by copying the active buffer over
    /// it. Only differing words are written, so the pass is idempotent and
    /// converges when restarted after a power failure.
    ///
    /// Returns the number of durable writes.
    pub fn rollback<S: DurableStore + ?Sized>(&self, store: &mut S) -> Result<usize> {
        let src = self.active_region(store);
        let dest = self.working_region(store);
        let writes = region::copy_diff(store, src, dest)?;
        tracing::debug!(writes, "whole-buffer rollback");
        Ok(writes)
    }

    /// Rollback restricted to the ranges in the dirty list. Falls back to
    /// [`rollback`](Self::rollback) when the list overflowed or holds an
    /// entry outside the buffers.
    pub fn rollback_tracked<S: DurableStore + ?Sized>(&self, store: &mut S, dirty: &DirtyTracker) -> Result<usize> {
        if dirty.is_overflowed(store) {
            return self.rollback(store);
        }
        let src = self.active_region(store);
        let dest = self.working_region(store);
        let mut writes = 0;
        for i in 0..dirty.len(store) {
            let entry = dirty.entry(store, i);
            let Some(offset) = entry.offset(&self.layout) else {
                return self.rollback(store);
            };
            writes += region::copy_diff(store, src.slice(offset, entry.size), dest.slice(offset, entry.size))?;
        }
        tracing::debug!(writes, "tracked rollback");
        Ok(writes)
    }
}
