// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Progress marker shared by the buffer commit and the context handoff.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Phase {
    Ready = 0,
    Commit1 = 1,
    Commit2 = 2,
}

impl Phase {
    /// Decodes a persisted word. Anything unrecognised reads as `Ready`,
    /// which sends the prologue down the rollback path.
    pub fn from_word(word: u32) -> Self {
        match word {
            1 => Phase::Commit1,
            2 => Phase::Commit2,
            _ => Phase::Ready,
        }
    }

    pub fn to_word(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Ready => "READY",
            Phase::Commit1 => "COMMIT1",
            Phase::Commit2 => "COMMIT2",
        }
    }
}
