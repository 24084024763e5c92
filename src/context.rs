// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Double-buffered contexts.
//!
//! A context binds a task to its handoff state. Two context records exist
//! and `curctx` selects one; switching tasks prepares the other record and
//! then repoints `curctx` with a single word write.

use crate::error::Result;
use crate::layout::{Layout, CTX_NEED_COMMIT, CTX_STATE, CTX_TASK, CURCTX, CURTSK};
use crate::nvm::DurableStore;
use crate::state::phase::Phase;
use crate::types::id::{Addr, TaskId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ContextSlot {
    Zero = 0,
    One = 1,
}

impl ContextSlot {
    pub fn from_word(word: u32) -> Self {
        if word & 1 == 0 {
            ContextSlot::Zero
        } else {
            ContextSlot::One
        }
    }

    pub fn to_word(self) -> u32 {
        self as u32
    }

    pub fn other(self) -> Self {
        match self {
            ContextSlot::Zero => ContextSlot::One,
            ContextSlot::One => ContextSlot::Zero,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextRecord {
    pub task: TaskId,
    pub need_commit: bool,
    /// Handoff progress of `task` as bound in this context.
    pub state: Phase,
}

#[derive(Clone, Copy, Debug)]
pub struct Contexts {
    layout: Layout,
}

impl Contexts {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    fn field(&self, slot: ContextSlot, field: u32) -> Addr {
        self.layout.context(slot.to_word()).offset(field)
    }

    pub fn current<S: DurableStore + ?Sized>(&self, store: &S) -> ContextSlot {
        ContextSlot::from_word(store.read_word(CURCTX))
    }

    /// Task the last transition handed off to.
    pub fn current_task<S: DurableStore + ?Sized>(&self, store: &S) -> TaskId {
        TaskId(store.read_word(CURTSK))
    }

    pub fn read<S: DurableStore + ?Sized>(&self, store: &S, slot: ContextSlot) -> ContextRecord {
        ContextRecord {
            task: TaskId(store.read_word(self.field(slot, CTX_TASK))),
            need_commit: store.read_word(self.field(slot, CTX_NEED_COMMIT)) != 0,
            state: Phase::from_word(store.read_word(self.field(slot, CTX_STATE))),
        }
    }

    pub fn set_current<S: DurableStore + ?Sized>(&self, store: &mut S, slot: ContextSlot) -> Result<()> {
        store.write_word(CURCTX, slot.to_word())
    }

    pub fn set_current_task<S: DurableStore + ?Sized>(&self, store: &mut S, task: TaskId) -> Result<()> {
        store.write_word(CURTSK, task.0)
    }

    pub fn bind_task<S: DurableStore + ?Sized>(&self, store: &mut S, slot: ContextSlot, task: TaskId) -> Result<()> {
        store.write_word(self.field(slot, CTX_TASK), task.0)
    }

    pub fn set_need_commit<S: DurableStore + ?Sized>(&self, store: &mut S, slot: ContextSlot, flag: bool) -> Result<()> {
        store.write_word(self.field(slot, CTX_NEED_COMMIT), flag as u32)
    }

    pub fn update_task_state<S: DurableStore + ?Sized>(&self, store: &mut S, slot: ContextSlot, state: Phase) -> Result<()> {
        store.write_word(self.field(slot, CTX_STATE), state.to_word())
    }

    /// Cold-start contents: context 0 runs `entry` from scratch, context 1
    /// is idle, and both pointers name context 0 / `entry`.
    pub fn format<S: DurableStore + ?Sized>(&self, store: &mut S, entry: TaskId) -> Result<()> {
        for slot in [ContextSlot::Zero, ContextSlot::One] {
            self.bind_task(store, slot, entry)?;
            self.set_need_commit(store, slot, false)?;
            self.update_task_state(store, slot, Phase::Ready)?;
        }
        self.set_current_task(store, entry)?;
        self.set_current(store, ContextSlot::Zero)
    }
}
