//! File-backed NVM.
//!
//! The file holds the NVM contents as little-endian words and is mapped
//! into memory. Every word write is flushed before it returns, so killing
//! the process between two writes leaves the same picture a power failure
//! leaves on the device.

use byteorder::{ByteOrder, LittleEndian};
use ember_kernel::config::WORD_BYTES;
use ember_kernel::nvm::{BulkProgram, DurableStore};
use ember_kernel::{Addr, KernelError, KernelResult};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{PersistenceError, Result};

pub struct MappedStore {
    mmap: MmapMut,
    words: usize,
    path: PathBuf,
}

impl MappedStore {
    /// Creates (or truncates) an NVM file of `words` erased words.
    pub fn create(path: impl AsRef<Path>, words: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len((words * WORD_BYTES) as u64)?;

        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        mmap.fill(0xFF);
        mmap.flush()?;
        tracing::debug!(?path, words, "created NVM file");

        Ok(Self {
            mmap,
            words,
            path: path.to_path_buf(),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len() as usize;
        if len == 0 || len % WORD_BYTES != 0 {
            return Err(PersistenceError::InvalidFormat(format!(
                "NVM file length {} is not a positive multiple of {}",
                len, WORD_BYTES
            )));
        }

        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            mmap,
            words: len / WORD_BYTES,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies the whole NVM out as words.
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = vec![0u32; self.words];
        LittleEndian::read_u32_into(&self.mmap[..], &mut words);
        words
    }

    fn flush(&self, addr: Addr, words: usize) -> KernelResult<()> {
        self.mmap
            .flush_range(addr.byte_address(), words * WORD_BYTES)
            .map_err(|e| {
                // An unflushed write is indistinguishable from one cut off by
                // a power failure; recovery handles it the same way.
                tracing::error!(error = %e, addr = addr.0, "NVM flush failed");
                KernelError::PowerLoss
            })
    }
}

impl DurableStore for MappedStore {
    fn capacity_words(&self) -> usize {
        self.words
    }

    fn read_word(&self, addr: Addr) -> u32 {
        let off = addr.byte_address();
        LittleEndian::read_u32(&self.mmap[off..off + WORD_BYTES])
    }

    fn write_word(&mut self, addr: Addr, value: u32) -> KernelResult<()> {
        let off = addr.byte_address();
        LittleEndian::write_u32(&mut self.mmap[off..off + WORD_BYTES], value);
        self.flush(addr, 1)
    }
}

impl BulkProgram for MappedStore {
    fn program_block(&mut self, dest: Addr, words: &[u32]) -> KernelResult<()> {
        let off = dest.byte_address();
        LittleEndian::write_u32_into(words, &mut self.mmap[off..off + words.len() * WORD_BYTES]);
        self.flush(dest, words.len())
    }
}
