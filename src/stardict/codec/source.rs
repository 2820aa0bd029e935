//! Random-access byte sources for the definition blob.
//!
//! A [`BlockSource`] hands out arbitrary byte ranges of the *uncompressed*
//! definition data. Implementations decide how much work one range costs:
//! a plain file is a seek and a read, a dictzip file inflates only the
//! chunks overlapping the range.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use log::{debug, trace};

use crate::stardict::types::error::{StardictError, Result};

/// Random access to the uncompressed bytes of a definition blob.
///
/// Implementations must be safe to share between threads: lookups on one
/// dictionary handle may read overlapping or disjoint ranges concurrently.
pub trait BlockSource: Send + Sync + std::fmt::Debug {
    /// Total uncompressed length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes in `[offset, offset + length)`.
    ///
    /// Callers check the range against [`len`](Self::len) first; sources may
    /// still fail with `Io` or `Decompression` on truncated storage.
    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>>;

    /// Returns the whole blob. Intended for small sources.
    fn read_all(&self) -> Result<Vec<u8>> {
        self.read_range(0, self.len())
    }
}

/// Checks that `[offset, offset + length)` lies inside a blob of `len` bytes.
pub fn check_range(offset: u64, length: u64, len: u64) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(()),
        _ => Err(StardictError::InvalidFormat(format!(
            "Range at offset {} with size {} exceeds definition data of {} bytes",
            offset, length, len
        ))),
    }
}

/// An uncompressed `.dict` file.
#[derive(Debug)]
pub struct PlainSource {
    file: Mutex<File>,
    len: u64,
}

impl PlainSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        debug!("Opened plain definition file {} ({} bytes)", path.display(), len);
        Ok(Self {
            file: Mutex::new(file),
            len,
        })
    }
}

impl BlockSource for PlainSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.len)?;
        trace!("Reading {} bytes at offset {} from plain file", length, offset);
        let mut file = self.file.lock().map_err(|_| StardictError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// A definition blob already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl BlockSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.len())?;
        let start = offset as usize;
        Ok(self.data[start..start + length as usize].to_vec())
    }
}
