//! Digests, invariant checks and state reports.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use byteorder::{ByteOrder, LittleEndian};

use crate::context::{ContextRecord, ContextSlot, Contexts};
use crate::error::{KernelError, Result};
use crate::layout::Layout;
use crate::nvm::DurableStore;
use crate::region::{self, Region};
use crate::state::dirty::DirtyTracker;
use crate::state::manager::StateManager;
use crate::state::phase::Phase;
use crate::types::id::TaskId;

/// BLAKE3 digest of a region's words, little-endian.
pub fn region_digest<S: DurableStore + ?Sized>(store: &S, region: Region) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    let mut chunk = [0u8; 64];
    let mut filled = 0;
    for addr in region.iter() {
        LittleEndian::write_u32(&mut chunk[filled..filled + 4], store.read_word(addr));
        filled += 4;
        if filled == chunk.len() {
            hasher.update(&chunk);
            filled = 0;
        }
    }
    hasher.update(&chunk[..filled]);
    *hasher.finalize().as_bytes()
}

/// Checks the invariants that hold whenever the runtime is settled, i.e.
/// after a prologue returned and before the next task writes anything.
pub fn check_invariants<S: DurableStore + ?Sized>(store: &S, layout: &Layout) -> Result<()> {
    let manager = StateManager::new(*layout);
    let contexts = Contexts::new(*layout);

    if !manager.is_initialized(store) {
        return Err(KernelError::Inconsistent("signature not stamped"));
    }
    if manager.commit_state(store) != Phase::Ready {
        return Err(KernelError::Inconsistent("buffer swap in progress"));
    }
    let slot = contexts.current(store);
    if contexts.read(store, slot).state != Phase::Ready {
        return Err(KernelError::Inconsistent("handoff in progress"));
    }
    if !region::equal(store, layout.buffer(0), layout.buffer(1)) {
        return Err(KernelError::Inconsistent("buffers diverge"));
    }
    Ok(())
}

/// Snapshot of every persisted control word, for inspection tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateReport {
    pub initialized: bool,
    pub index: u32,
    pub new_index: u32,
    pub need_commit: bool,
    pub commit_state: Phase,
    pub curctx: ContextSlot,
    pub curtsk: TaskId,
    pub contexts: [ContextRecord; 2],
    pub dirty_len: u32,
    pub dirty_overflow: bool,
    pub active_digest: [u8; 32],
    pub working_digest: [u8; 32],
    /// Offset of the first word where the buffers differ.
    pub first_difference: Option<u32>,
}

pub fn report<S: DurableStore + ?Sized>(store: &S, layout: &Layout) -> StateReport {
    let manager = StateManager::new(*layout);
    let contexts = Contexts::new(*layout);
    let dirty = DirtyTracker::new(*layout);
    let active = manager.active_region(store);
    let working = manager.working_region(store);

    StateReport {
        initialized: manager.is_initialized(store),
        index: manager.index(store),
        new_index: manager.new_index(store),
        need_commit: manager.need_commit(store),
        commit_state: manager.commit_state(store),
        curctx: contexts.current(store),
        curtsk: contexts.current_task(store),
        contexts: [
            contexts.read(store, ContextSlot::Zero),
            contexts.read(store, ContextSlot::One),
        ],
        dirty_len: dirty.len(store),
        dirty_overflow: dirty.is_overflowed(store),
        active_digest: region_digest(store, active),
        working_digest: region_digest(store, working),
        first_difference: region::first_difference(store, active, working),
    }
}
