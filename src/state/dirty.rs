// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Persisted dirty list.
//!
//! Application writes append `{src, dest, size}` before touching the working
//! buffer, so a rollback can restore just the touched ranges. The list is an
//! optimization: when it is disabled or has overflowed, the whole-buffer
//! rollback runs instead.

use crate::error::Result;
use crate::layout::{Layout, DIRTY_COUNT, DIRTY_OVERFLOW};
use crate::nvm::DurableStore;
use crate::types::id::Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyEntry {
    /// Where the pre-mutation value lives (active buffer at record time).
    pub src: Addr,
    /// The word range being mutated (working buffer at record time).
    pub dest: Addr,
    pub size: u32,
}

impl DirtyEntry {
    /// Offset of the range inside the critical-variable region. Valid
    /// whichever buffer is active now, since both share one layout.
    pub fn offset(&self, layout: &Layout) -> Option<u32> {
        layout
            .buffer(0)
            .offset_of(self.dest)
            .or_else(|| layout.buffer(1).offset_of(self.dest))
    }

    fn covers(&self, layout: &Layout, offset: u32, size: u32) -> bool {
        match self.offset(layout) {
            Some(start) => start <= offset && offset + size <= start + self.size,
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DirtyTracker {
    layout: Layout,
}

impl DirtyTracker {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn len<S: DurableStore + ?Sized>(&self, store: &S) -> u32 {
        store.read_word(DIRTY_COUNT).min(self.layout.dirty_capacity())
    }

    pub fn is_empty<S: DurableStore + ?Sized>(&self, store: &S) -> bool {
        self.len(store) == 0
    }

    pub fn is_overflowed<S: DurableStore + ?Sized>(&self, store: &S) -> bool {
        store.read_word(DIRTY_OVERFLOW) != 0
            || store.read_word(DIRTY_COUNT) > self.layout.dirty_capacity()
    }

    pub fn entry<S: DurableStore + ?Sized>(&self, store: &S, i: u32) -> DirtyEntry {
        let base = self.layout.dirty_entry(i);
        DirtyEntry {
            src: Addr(store.read_word(base)),
            dest: Addr(store.read_word(base.offset(1))),
            size: store.read_word(base.offset(2)),
        }
    }

    pub fn entries<'a, S: DurableStore + ?Sized>(&'a self, store: &'a S) -> impl Iterator<Item = DirtyEntry> + 'a {
        (0..self.len(store)).map(move |i| self.entry(store, i))
    }

    /// Appends an entry. The entry words land before the count, so a torn
    /// append is invisible. Ranges already covered are not re-recorded; a
    /// full list sets the overflow flag instead.
    pub fn record<S: DurableStore + ?Sized>(&self, store: &mut S, src: Addr, dest: Addr, size: u32) -> Result<()> {
        if size == 0 || self.is_overflowed(store) {
            return Ok(());
        }
        let candidate = DirtyEntry { src, dest, size };
        if let Some(offset) = candidate.offset(&self.layout) {
            if self.entries(store).any(|e| e.covers(&self.layout, offset, size)) {
                return Ok(());
            }
        }

        let count = self.len(store);
        if count >= self.layout.dirty_capacity() {
            tracing::debug!(count, "dirty list full, falling back to whole-buffer rollback");
            store.write_word(DIRTY_OVERFLOW, 1)?;
            return Ok(());
        }

        let base = self.layout.dirty_entry(count);
        store.write_word(base, src.0)?;
        store.write_word(base.offset(1), dest.0)?;
        store.write_word(base.offset(2), size)?;
        store.write_word(DIRTY_COUNT, count + 1)
    }

    /// Forces the next tracked rollback to cover the whole buffer. Used when
    /// a write happens with tracking disabled.
    pub fn invalidate<S: DurableStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.write_if_changed(DIRTY_OVERFLOW, 1)?;
        Ok(())
    }

    /// Empties the list. Count first: a list with count 0 and the overflow
    /// flag still set only costs one extra whole-buffer rollback.
    pub fn clear<S: DurableStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.write_if_changed(DIRTY_COUNT, 0)?;
        store.write_if_changed(DIRTY_OVERFLOW, 0)?;
        Ok(())
    }
}
