//! Random access into dictzip (`.dict.dz`) files.
//!
//! # File Structure
//! ```text
//! [10 bytes] gzip header (ID1 ID2 CM FLG MTIME XFL OS)
//! [2 bytes]  XLEN (little-endian)
//! [XLEN]     extra subfields; the "RA" subfield holds:
//!              VER(2) CHLEN(2) CHCNT(2) CHCNT x compressed chunk size(2)
//! [..]       optional FNAME / FCOMMENT (NUL terminated), FHCRC(2)
//! [..]       CHCNT raw deflate chunks, each ended by a full flush
//! [8 bytes]  CRC32, ISIZE (little-endian)
//! ```
//!
//! Every chunk inflates to `CHLEN` bytes except the last.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, trace};
use lru::LruCache;

use super::compression;
use super::source::{check_range, BlockSource};
use crate::stardict::types::error::{StardictError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const CM_DEFLATE: u8 = 8;
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const GZIP_TRAILER_LEN: u64 = 8;

/// Location of one compressed chunk in the file.
#[derive(Debug, Clone, Copy)]
struct ChunkMeta {
    file_offset: u64,
    compressed_size: u64,
}

/// Chunk table parsed from the "RA" extra subfield.
#[derive(Debug)]
struct ChunkTable {
    chunk_len: u64,
    compressed_sizes: Vec<u64>,
}

/// A dictzip-compressed definition blob.
///
/// Only the chunks overlapping a requested range are inflated. Inflated
/// chunks are kept in a bounded LRU cache keyed by chunk index.
#[derive(Debug)]
pub struct DictZipSource {
    file: Mutex<File>,
    chunk_len: u64,
    chunks: Vec<ChunkMeta>,
    len: u64,
    cache: Option<Mutex<LruCache<usize, Arc<Vec<u8>>>>>,
}

impl DictZipSource {
    /// Opens a `.dict.dz` file and reads its chunk table.
    ///
    /// `cache_capacity` is the number of inflated chunks to keep; `0` disables
    /// the cache.
    pub fn open(path: impl AsRef<Path>, cache_capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening dictzip file: {}", path.display());
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let (table, data_start) = {
            let mut reader = BufReader::new(&mut file);
            let table = parse_header(&mut reader)?;
            let data_start = reader.stream_position()?;
            (table, data_start)
        };

        let mut chunks = Vec::with_capacity(table.compressed_sizes.len());
        let mut file_offset = data_start;
        for &compressed_size in &table.compressed_sizes {
            chunks.push(ChunkMeta {
                file_offset,
                compressed_size,
            });
            file_offset += compressed_size;
        }
        if file_offset + GZIP_TRAILER_LEN > file_len {
            return Err(StardictError::InvalidFormat(format!(
                "Dictzip chunk table covers {} bytes but the file has only {}",
                file_offset + GZIP_TRAILER_LEN,
                file_len
            )));
        }

        file.seek(SeekFrom::End(-4))?;
        let isize = file.read_u32::<LittleEndian>()?;
        let len = uncompressed_len(&table, isize)?;

        info!(
            "Dictzip file opened: {} chunks of {} bytes, {} bytes uncompressed",
            chunks.len(),
            table.chunk_len,
            len
        );

        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));

        Ok(Self {
            file: Mutex::new(file),
            chunk_len: table.chunk_len,
            chunks,
            len,
            cache,
        })
    }

    /// Returns the number of compressed chunks.
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the inflated contents of a chunk, from cache if possible.
    fn chunk(&self, index: usize) -> Result<Arc<Vec<u8>>> {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().map_err(|_| StardictError::LockPoisoned)?;
            if let Some(bytes) = cache.get(&index) {
                trace!("Chunk {} served from cache", index);
                return Ok(Arc::clone(bytes));
            }
        }

        let bytes = Arc::new(self.read_and_inflate_chunk(index)?);

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().map_err(|_| StardictError::LockPoisoned)?;
            cache.put(index, Arc::clone(&bytes));
        }
        Ok(bytes)
    }

    fn read_and_inflate_chunk(&self, index: usize) -> Result<Vec<u8>> {
        let meta = self.chunks.get(index).ok_or_else(|| {
            StardictError::InvalidFormat(format!("Invalid dictzip chunk index: {}", index))
        })?;

        let mut raw_chunk = vec![0u8; meta.compressed_size as usize];
        {
            let mut file = self.file.lock().map_err(|_| StardictError::LockPoisoned)?;
            file.seek(SeekFrom::Start(meta.file_offset))?;
            file.read_exact(&mut raw_chunk)?;
        }

        let chunk_start = index as u64 * self.chunk_len;
        let expected_size = (self.len - chunk_start).min(self.chunk_len) as usize;
        let mut inflated = Vec::new();
        compression::inflate_chunk_into(&mut inflated, &raw_chunk, expected_size)?;
        Ok(inflated)
    }
}

impl BlockSource for DictZipSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.len)?;
        if length == 0 {
            return Ok(Vec::new());
        }

        let end = offset + length;
        let first_chunk = (offset / self.chunk_len) as usize;
        let last_chunk = ((end - 1) / self.chunk_len) as usize;
        trace!(
            "Reading {} bytes at offset {} from dictzip chunks {}..={}",
            length, offset, first_chunk, last_chunk
        );

        let mut out = Vec::with_capacity(length as usize);
        for index in first_chunk..=last_chunk {
            let chunk = self.chunk(index)?;
            let chunk_start = index as u64 * self.chunk_len;
            let from = (offset.max(chunk_start) - chunk_start) as usize;
            let to = (end.min(chunk_start + self.chunk_len) - chunk_start) as usize;
            let slice = chunk.get(from..to).ok_or_else(|| {
                StardictError::Decompression(format!(
                    "Dictzip chunk {} is shorter than expected ({} < {})",
                    index,
                    chunk.len(),
                    to
                ))
            })?;
            out.extend_from_slice(slice);
        }
        Ok(out)
    }
}

/// Parses the gzip header up to the start of the compressed data.
fn parse_header<R: Read>(reader: &mut R) -> Result<ChunkTable> {
    let mut magic = [0u8; 2];
    reader.read_exact(&mut magic)?;
    if magic != GZIP_MAGIC {
        return Err(StardictError::InvalidFormat("Not a gzip file".to_string()));
    }
    let method = reader.read_u8()?;
    if method != CM_DEFLATE {
        return Err(StardictError::InvalidFormat(format!(
            "Unsupported gzip compression method: {}",
            method
        )));
    }
    let flags = reader.read_u8()?;
    // MTIME(4) XFL(1) OS(1)
    let mut skipped = [0u8; 6];
    reader.read_exact(&mut skipped)?;

    if flags & FEXTRA == 0 {
        return Err(StardictError::InvalidFormat(
            "Gzip file has no extra field; not a dictzip file".to_string(),
        ));
    }
    let extra_len = reader.read_u16::<LittleEndian>()?;
    let mut extra = vec![0u8; extra_len as usize];
    reader.read_exact(&mut extra)?;
    let table = find_chunk_table(&extra)?;

    if flags & FNAME != 0 {
        skip_cstring(reader)?;
    }
    if flags & FCOMMENT != 0 {
        skip_cstring(reader)?;
    }
    if flags & FHCRC != 0 {
        reader.read_u16::<LittleEndian>()?;
    }

    debug!(
        "Dictzip chunk table: chunk_len={}, chunks={}",
        table.chunk_len,
        table.compressed_sizes.len()
    );
    Ok(table)
}

/// Walks the extra subfields looking for the "RA" random-access table.
fn find_chunk_table(extra: &[u8]) -> Result<ChunkTable> {
    let mut reader = extra;
    while reader.len() >= 4 {
        let id = [reader[0], reader[1]];
        reader = &reader[2..];
        let field_len = reader.read_u16::<LittleEndian>()? as usize;
        if reader.len() < field_len {
            return Err(StardictError::InvalidFormat(
                "Truncated gzip extra subfield".to_string(),
            ));
        }
        let (field, rest) = reader.split_at(field_len);
        reader = rest;
        if id == *b"RA" {
            return parse_chunk_table(field);
        }
    }
    Err(StardictError::InvalidFormat(
        "No dictzip \"RA\" subfield in gzip extra field".to_string(),
    ))
}

fn parse_chunk_table(mut field: &[u8]) -> Result<ChunkTable> {
    let truncated = |_| StardictError::InvalidFormat("Truncated dictzip chunk table".to_string());
    let version = field.read_u16::<LittleEndian>().map_err(truncated)?;
    if version != 1 {
        return Err(StardictError::InvalidFormat(format!(
            "Unsupported dictzip version: {}",
            version
        )));
    }
    let chunk_len = field.read_u16::<LittleEndian>().map_err(truncated)?;
    if chunk_len == 0 {
        return Err(StardictError::InvalidFormat(
            "Dictzip chunk length is zero".to_string(),
        ));
    }
    let chunk_count = field.read_u16::<LittleEndian>().map_err(truncated)?;
    let compressed_sizes = (0..chunk_count)
        .map(|_| field.read_u16::<LittleEndian>().map(u64::from).map_err(truncated))
        .collect::<Result<Vec<_>>>()?;

    Ok(ChunkTable {
        chunk_len: u64::from(chunk_len),
        compressed_sizes,
    })
}

fn skip_cstring<R: Read>(reader: &mut R) -> Result<()> {
    while reader.read_u8()? != 0 {}
    Ok(())
}

/// Recovers the uncompressed length from ISIZE (length mod 2^32).
///
/// The chunk table bounds the length to `((n - 1) * chunk_len, n * chunk_len]`,
/// which fixes the missing high bits.
fn uncompressed_len(table: &ChunkTable, isize: u32) -> Result<u64> {
    let count = table.compressed_sizes.len() as u64;
    if count == 0 {
        return Ok(0);
    }
    let lower = (count - 1) * table.chunk_len;
    let upper = count * table.chunk_len;

    let mut len = u64::from(isize);
    while len <= lower && lower > 0 {
        len += 1 << 32;
    }
    if len > upper {
        return Err(StardictError::InvalidFormat(format!(
            "Gzip trailer size {} is inconsistent with {} chunks of {} bytes",
            isize, count, table.chunk_len
        )));
    }
    Ok(len)
}
