// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod dirty;
pub mod manager;
pub mod phase;

pub use dirty::{DirtyEntry, DirtyTracker};
pub use manager::StateManager;
pub use phase::Phase;
