// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! ember-kernel: crash-consistent task execution for intermittently powered
//! devices with byte-addressable non-volatile memory.
//!
//! Application state lives in two same-layout buffers of critical
//! variables. Tasks mutate the working buffer; handing off to the next task
//! commits it by swapping the active index, and an interrupted task is
//! rolled back by copying the active buffer over the working one. Every
//! step is a single atomic word write, ordered so that a power failure
//! between any two writes is recovered by the boot prologue.

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod layout;
pub mod nvm;
pub mod region;
pub mod state;
pub mod task;
pub mod types;
pub mod verify;

pub use config::RuntimeConfig;
pub use engine::{BootKind, Runtime};
pub use error::{KernelError, KernelResult};
pub use nvm::{BulkProgram, DurableStore, MmioStore, PowerFault, RamStore};
pub use state::{Phase, StateManager};
pub use task::{TaskCtx, TaskEntry, TaskTable};
pub use types::id::{Addr, TaskId, Var};

#[cfg(test)]
pub mod tests;
