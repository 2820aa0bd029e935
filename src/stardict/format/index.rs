//! `.idx` word index parsing.
//!
//! # Record Structure
//! ```text
//! [N bytes]  headword (encoded text, no NUL inside)
//! [1 byte]   0x00 terminator
//! [4|8 B]    data offset (big-endian; 8 bytes when idxoffsetbits=64)
//! [4 bytes]  data size (big-endian)
//! ```
//!
//! Records are yielded in file order. The order is significant: synonym
//! entries refer to records by position.

use log::{debug, info, warn};

use crate::stardict::types::error::{StardictError, Result};
use crate::stardict::types::models::{DictionaryMetadata, IndexRecord};
use crate::stardict::utils;

/// Parses a fully decompressed `.idx` file.
///
/// # Errors
/// Returns `InvalidFormat` for a missing terminator, undecodable headword or
/// truncated number field, and `CountMismatch` when the number of records
/// differs from `metadata.word_count`.
pub fn parse(index_bytes: &[u8], metadata: &DictionaryMetadata) -> Result<Vec<IndexRecord>> {
    info!("Parsing index: {} bytes", index_bytes.len());

    if let Some(declared) = metadata.idx_file_size
        && declared != index_bytes.len() as u64
    {
        warn!(
            "Index size differs from idxfilesize: declared {} bytes, found {}",
            declared,
            index_bytes.len()
        );
    }

    let offset_width = metadata.idx_offset_bits.number_width();
    let capacity = usize::try_from(metadata.word_count).unwrap_or(0);
    let mut records = Vec::with_capacity(capacity.min(index_bytes.len() / 6 + 1));
    let mut reader = index_bytes;

    while !reader.is_empty() {
        let position = records.len();
        let headword_bytes = utils::take_null_terminated(&mut reader).ok_or_else(|| {
            StardictError::InvalidFormat(format!(
                "Missing terminator for headword of index record {}",
                position
            ))
        })?;
        let headword = utils::decode_text(headword_bytes, metadata.encoding).map_err(|_| {
            StardictError::InvalidFormat(format!(
                "Headword of index record {} is not valid {}",
                position,
                metadata.encoding.name()
            ))
        })?;
        let data_offset = utils::read_number(&mut reader, offset_width).map_err(|e| {
            StardictError::InvalidFormat(format!("Offset of '{}': {}", headword, e))
        })?;
        let data_size = utils::read_u32(&mut reader).map_err(|e| {
            StardictError::InvalidFormat(format!("Size of '{}': {}", headword, e))
        })?;

        records.push(IndexRecord {
            headword,
            data_offset,
            data_size,
        });
    }

    if records.len() as u64 != metadata.word_count {
        return Err(StardictError::CountMismatch {
            item_type: "index records",
            expected: metadata.word_count,
            found: records.len() as u64,
        });
    }

    debug!("Index parsed: {} records", records.len());
    Ok(records)
}
