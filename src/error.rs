// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use core::fmt;

use crate::types::id::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The durable store lost power; the write did not land.
    PowerLoss,
    /// The store cannot hold the persisted layout.
    StoreTooSmall { required: usize, available: usize },
    /// A fixed-capacity table is full.
    CapacityExceeded,
    /// A task id that was never registered.
    UnknownTask(TaskId),
    /// Variable offset outside the critical-variable region.
    VarOutOfRange(u32),
    /// Bulk programming start address is not 16-byte aligned.
    Misaligned(u32),
    /// Source and destination regions differ in length.
    RegionMismatch,
    /// Persisted state violates a protocol invariant.
    Inconsistent(&'static str),
    /// Invalid operation.
    InvalidOperation,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::PowerLoss => write!(f, "power lost during durable write"),
            KernelError::StoreTooSmall { required, available } => write!(
                f,
                "store too small: layout needs {} words, store has {}",
                required, available
            ),
            KernelError::CapacityExceeded => write!(f, "capacity exceeded"),
            KernelError::UnknownTask(id) => write!(f, "unknown task {}", id.0),
            KernelError::VarOutOfRange(var) => write!(f, "variable offset {} out of range", var),
            KernelError::Misaligned(addr) => {
                write!(f, "word address {:#x} is not 16-byte aligned", addr)
            }
            KernelError::RegionMismatch => write!(f, "region length mismatch"),
            KernelError::Inconsistent(what) => write!(f, "inconsistent state: {}", what),
            KernelError::InvalidOperation => write!(f, "invalid operation"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
