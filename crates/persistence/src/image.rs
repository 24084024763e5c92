//! Checksummed NVM images.
//!
//! ```text
//! [magic "EMBR":4][version:4][word_count:4][reserved:4][crc64:8][words: 4 * word_count]
//! ```
//! All integers little-endian. The checksum covers the word payload.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc64fast::Digest;
use ember_kernel::nvm::{program_aligned, BulkProgram};
use ember_kernel::Addr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{PersistenceError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub word_count: u32,
    pub checksum: u64,
}

impl ImageHeader {
    pub const SIZE: usize = 4 + 4 + 4 + 4 + 8; // 24 bytes
    pub const MAGIC: [u8; 4] = *b"EMBR";
    pub const VERSION: u32 = 1;

    pub fn new(word_count: u32, checksum: u64) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            word_count,
            checksum,
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.word_count)?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u64::<LittleEndian>(self.checksum)?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        let word_count = reader.read_u32::<LittleEndian>()?;
        let _reserved = reader.read_u32::<LittleEndian>()?;
        let checksum = reader.read_u64::<LittleEndian>()?;
        Ok(Self {
            magic,
            version,
            word_count,
            checksum,
        })
    }
}

fn checksum(words: &[u32]) -> u64 {
    let mut digest = Digest::new();
    for word in words {
        digest.write(&word.to_le_bytes());
    }
    digest.sum64()
}

/// Writes an image next to `path` and renames it into place.
pub fn save_image(path: impl AsRef<Path>, words: &[u32]) -> Result<ImageHeader> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");
    let header = ImageHeader::new(words.len() as u32, checksum(words));
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        header.write_to(&mut writer)?;
        for &word in words {
            writer.write_u32::<LittleEndian>(word)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(header)
}

pub fn read_header(path: impl AsRef<Path>) -> Result<ImageHeader> {
    ImageHeader::read_from(BufReader::new(File::open(path)?))
}

/// Reads an image and verifies its checksum.
pub fn load_image(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let file = File::open(path)?;
    let payload = file.metadata()?.len().saturating_sub(ImageHeader::SIZE as u64);
    let mut reader = BufReader::new(file);
    let header = ImageHeader::read_from(&mut reader)?;

    let expected = header.word_count as u64 * 4;
    if expected != payload {
        return Err(PersistenceError::InvalidFormat(format!(
            "header declares {} words ({} bytes) but payload is {} bytes",
            header.word_count, expected, payload
        )));
    }

    let mut words = vec![0u32; header.word_count as usize];
    reader.read_u32_into::<LittleEndian>(&mut words)?;

    let found = checksum(&words);
    if found != header.checksum {
        return Err(PersistenceError::ChecksumMismatch {
            expected: header.checksum,
            found,
        });
    }
    Ok(words)
}

/// Programs an image into a store from address 0 with the bulk primitive.
pub fn restore_into<S: BulkProgram>(store: &mut S, words: &[u32]) -> Result<()> {
    if words.len() > store.capacity_words() {
        return Err(PersistenceError::InvalidFormat(format!(
            "image has {} words, store holds {}",
            words.len(),
            store.capacity_words()
        )));
    }
    program_aligned(store, Addr(0), words)?;
    Ok(())
}
