//! `.syn` synonym table.
//!
//! # Entry Structure
//! ```text
//! [N bytes]  synonym word
//! [1 byte]   0x00 terminator
//! [4 bytes]  position of the canonical record in the .idx file (big-endian)
//! ```
//!
//! A malformed entry is dropped with a warning instead of failing the whole
//! dictionary.

use std::collections::HashMap;

use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::stardict::types::options::CaseFolding;
use crate::stardict::utils;

/// Alternate headword → record positions.
#[derive(Debug, Default)]
pub struct SynonymTable {
    words: HashMap<String, Vec<usize>>,
    entries: usize,
    dropped: usize,
    case_folding: CaseFolding,
}

impl SynonymTable {
    /// A table with no synonyms, for dictionaries without a `.syn` file.
    pub fn empty(case_folding: CaseFolding) -> Self {
        Self {
            case_folding,
            ..Self::default()
        }
    }

    /// Parses a fully decompressed `.syn` file.
    ///
    /// Entries pointing at positions `>= word_count` are dropped and counted
    /// in [`dropped`](Self::dropped). A truncated trailing entry is dropped
    /// the same way.
    pub fn parse(
        syn_bytes: &[u8],
        word_count: u64,
        encoding: &'static Encoding,
        case_folding: CaseFolding,
    ) -> Self {
        info!("Parsing synonyms: {} bytes", syn_bytes.len());
        let mut table = Self::empty(case_folding);
        let mut reader = syn_bytes;

        while !reader.is_empty() {
            let Some(word_bytes) = utils::take_null_terminated(&mut reader) else {
                warn!("Dropping truncated synonym entry: missing terminator");
                table.dropped += 1;
                break;
            };
            let Ok(position) = utils::read_u32(&mut reader) else {
                warn!("Dropping truncated synonym entry: missing record position");
                table.dropped += 1;
                break;
            };
            let word = match utils::decode_text(word_bytes, encoding) {
                Ok(word) => word,
                Err(e) => {
                    warn!("Dropping synonym entry for record {}: {}", position, e);
                    table.dropped += 1;
                    continue;
                }
            };
            if u64::from(position) >= word_count {
                warn!(
                    "Dropping synonym '{}': record position {} is out of range (wordcount={})",
                    word, position, word_count
                );
                table.dropped += 1;
                continue;
            }
            table.insert(&word, position as usize);
        }

        debug!(
            "Synonyms parsed: {} entries, {} distinct words, {} dropped",
            table.entries,
            table.words.len(),
            table.dropped
        );
        table
    }

    fn insert(&mut self, word: &str, position: usize) {
        let key = self.case_folding.normalize(word).into_owned();
        self.words.entry(key).or_default().push(position);
        self.entries += 1;
    }

    /// Record positions the synonym `word` refers to; empty if unknown.
    pub fn lookup(&self, word: &str) -> &[usize] {
        let key = self.case_folding.normalize(word);
        self.words
            .get(&*key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of accepted synonym entries.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of entries discarded as malformed.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;

    fn entry(word: &str, position: u32) -> Vec<u8> {
        let mut bytes = word.as_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&position.to_be_bytes());
        bytes
    }

    #[test]
    fn out_of_range_entries_are_dropped_individually() {
        let mut syn = entry("hi", 0);
        syn.extend(entry("bogus", 7));
        syn.extend(entry("hey", 1));
        syn.extend(entry("hi", 1));

        let table = SynonymTable::parse(&syn, 2, UTF_8, CaseFolding::Sensitive);
        assert_eq!(table.lookup("hi"), &[0, 1]);
        assert_eq!(table.lookup("hey"), &[1]);
        assert!(table.lookup("bogus").is_empty());
        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped(), 1);
    }

    #[test]
    fn truncated_tail_keeps_earlier_entries() {
        let mut syn = entry("hi", 0);
        syn.extend_from_slice(b"tail\0\0\0");

        let table = SynonymTable::parse(&syn, 1, UTF_8, CaseFolding::Sensitive);
        assert_eq!(table.lookup("hi"), &[0]);
        assert_eq!(table.dropped(), 1);
    }

    #[test]
    fn case_folded_lookup() {
        let table = SynonymTable::parse(&entry("Colour", 0), 1, UTF_8, CaseFolding::Insensitive);
        assert_eq!(table.lookup("COLOUR"), &[0]);
    }
}
