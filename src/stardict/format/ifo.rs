//! `.ifo` metadata parsing.
//!
//! # File Structure
//! ```text
//! StarDict's dict ifo file
//! version=3.0.0
//! bookname=...
//! wordcount=...
//! idxfilesize=...
//! [idxoffsetbits=64]
//! [synwordcount=...]
//! [sametypesequence=...]
//! ...
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::stardict::types::error::{StardictError, Result};
use crate::stardict::types::models::{DictionaryMetadata, EntryType, FormatVersion, OffsetBits};

/// Magic first line of every `.ifo` file.
pub const IFO_MAGIC: &str = "StarDict's dict ifo file";

/// Reads and parses an `.ifo` file.
pub fn parse_file(path: &Path) -> Result<DictionaryMetadata> {
    info!("Parsing StarDict metadata: {}", path.display());
    let bytes = fs::read(path)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| StardictError::InvalidFormat(format!(".ifo file is not UTF-8: {}", e)))?;
    parse(text)
}

/// Parses the contents of an `.ifo` file.
pub fn parse(text: &str) -> Result<DictionaryMetadata> {
    let attrs = parse_attributes(text)?;
    let metadata = build_metadata_from_attributes(&attrs)?;

    info!(
        "Metadata parsed: version={}, bookname='{}', wordcount={}, synwordcount={:?}, offset_bits={:?}",
        metadata.version,
        metadata.book_name,
        metadata.word_count,
        metadata.syn_word_count,
        metadata.idx_offset_bits
    );
    Ok(metadata)
}

/// Splits the `key=value` lines following the magic header line.
fn parse_attributes(text: &str) -> Result<HashMap<String, String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines();

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != IFO_MAGIC {
        return Err(StardictError::InvalidFormat(format!(
            "Invalid header of .ifo file: {:?}",
            first
        )));
    }

    let mut attrs = HashMap::new();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            StardictError::InvalidFormat(format!("Invalid line in .ifo file: {:?}", line))
        })?;
        attrs.insert(key.trim().to_string(), value.to_string());
    }
    Ok(attrs)
}

fn parse_count(attrs: &HashMap<String, String>, key: &str) -> Result<Option<u64>> {
    attrs
        .get(key)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|e| {
                StardictError::InvalidFormat(format!("Could not parse '{}': {}", key, e))
            })
        })
        .transpose()
}

/// Builds metadata from parsed attributes, validating the required fields.
fn build_metadata_from_attributes(attrs: &HashMap<String, String>) -> Result<DictionaryMetadata> {
    let version_str = attrs
        .get("version")
        .ok_or_else(|| StardictError::InvalidFormat("Missing 'version' in .ifo file".to_string()))?;
    let version = FormatVersion::try_from(version_str.as_str())?;
    debug!("StarDict version: {}", version);

    let word_count = parse_count(attrs, "wordcount")?.ok_or_else(|| {
        StardictError::InvalidFormat("Missing 'wordcount' in .ifo file".to_string())
    })?;

    // idxoffsetbits is only meaningful from 3.0.0 on; older files are always 32-bit.
    let idx_offset_bits = match version {
        FormatVersion::V3_0_0 => match parse_count(attrs, "idxoffsetbits")? {
            Some(bits) => OffsetBits::try_from(u32::try_from(bits).unwrap_or(u32::MAX))?,
            None => OffsetBits::Bits32,
        },
        FormatVersion::V2_4_2 => OffsetBits::Bits32,
    };

    let same_type_sequence = attrs
        .get("sametypesequence")
        .map(|seq| EntryType::parse_sequence(seq.trim()))
        .transpose()?;
    debug!("sametypesequence: {:?}", same_type_sequence);

    let book_name = attrs
        .get("bookname")
        .cloned()
        .unwrap_or_else(|| "Untitled Dictionary".to_string());

    Ok(DictionaryMetadata {
        version,
        book_name,
        word_count,
        syn_word_count: parse_count(attrs, "synwordcount")?,
        idx_file_size: parse_count(attrs, "idxfilesize")?,
        idx_offset_bits,
        same_type_sequence,
        encoding: encoding_rs::UTF_8,
        author: attrs.get("author").cloned(),
        email: attrs.get("email").cloned(),
        website: attrs.get("website").cloned(),
        description: attrs.get("description").cloned(),
        date: attrs.get("date").cloned(),
        dict_type: attrs.get("dicttype").cloned(),
    })
}
