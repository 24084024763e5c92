// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

/// Word address inside a durable store (byte address / 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Addr(pub u32);

impl Addr {
    pub const fn offset(self, words: u32) -> Self {
        Addr(self.0 + words)
    }

    pub const fn byte_address(self) -> usize {
        self.0 as usize * crate::config::WORD_BYTES
    }
}

/// Registration index of a task in the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct TaskId(pub u32);

/// Word offset of a critical variable inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Var(pub u32);
