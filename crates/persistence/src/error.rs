use ember_kernel::KernelError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported image version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch {
        expected: u64,
        found: u64,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
