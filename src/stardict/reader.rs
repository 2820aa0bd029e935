use std::path::Path;

use log::{debug, info, warn};

use super::codec::compression;
use super::codec::{BlockSource, DictZipSource, PlainSource};
use super::files::DictionaryFiles;
use super::format::{ifo, index};
use super::format::payload::PayloadLayout;
use super::search::SearchIndex;
use super::synonyms::SynonymTable;
use super::types::error::{StardictError, Result};
use super::types::models::*;
use super::types::options::OpenOptions;

/// An opened StarDict dictionary.
///
/// Opening parses the whole index and synonym table and builds the search
/// index; it either fully succeeds or returns an error. Afterwards the handle
/// is read-only, so it can be shared across threads (e.g. in an `Arc`) and
/// queried concurrently.
#[derive(Debug)]
pub struct StarDict {
    metadata: DictionaryMetadata,
    records: Vec<IndexRecord>,
    search: SearchIndex,
    synonyms: SynonymTable,
    layout: PayloadLayout,
    definitions: Box<dyn BlockSource>,
}

impl StarDict {
    /// Opens a dictionary from its `.ifo` file.
    ///
    /// The `.idx[.gz]`, optional `.syn[.gz]` and `.dict[.dz]` files are looked
    /// up next to it, sharing its base name.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A file cannot be found or read
    /// - The `.ifo` file is malformed or declares an unsupported version
    /// - The index is malformed or its record count differs from `wordcount`
    /// - The dictzip header is invalid
    pub fn open(ifo_path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let ifo_path = ifo_path.as_ref();
        info!("Opening StarDict dictionary: {}", ifo_path.display());

        let metadata = ifo::parse_file(ifo_path)?;
        let files = DictionaryFiles::locate(ifo_path)?;

        let index_bytes = compression::read_maybe_gzip(&files.idx)?;
        let synonym_bytes = files
            .syn
            .as_deref()
            .map(compression::read_maybe_gzip)
            .transpose()?;

        let definitions: Box<dyn BlockSource> = if files.dict_is_dictzip() {
            Box::new(DictZipSource::open(&files.dict, options.chunk_cache_capacity)?)
        } else {
            Box::new(PlainSource::open(&files.dict)?)
        };

        Self::from_parts(
            metadata,
            &index_bytes,
            synonym_bytes.as_deref(),
            definitions,
            options,
        )
    }

    /// Assembles a dictionary from already loaded parts.
    ///
    /// `index_bytes` and `synonym_bytes` are the uncompressed contents of the
    /// `.idx` and `.syn` files.
    pub fn from_parts(
        mut metadata: DictionaryMetadata,
        index_bytes: &[u8],
        synonym_bytes: Option<&[u8]>,
        definitions: Box<dyn BlockSource>,
        options: &OpenOptions,
    ) -> Result<Self> {
        if let Some(encoding) = options.encoding
            && encoding != metadata.encoding
        {
            info!(
                "Text encoding overridden: declared='{}', final='{}'",
                metadata.encoding.name(),
                encoding.name()
            );
            metadata.encoding = encoding;
        }

        let records = index::parse(index_bytes, &metadata)?;
        let search = SearchIndex::build(&records, options.case_folding);

        let synonyms = match synonym_bytes {
            Some(bytes) => {
                let table = SynonymTable::parse(
                    bytes,
                    metadata.word_count,
                    metadata.encoding,
                    options.case_folding,
                );
                if let Some(declared) = metadata.syn_word_count
                    && declared != (table.len() + table.dropped()) as u64
                {
                    warn!(
                        "Synonym count differs from synwordcount: declared {}, found {}",
                        declared,
                        table.len() + table.dropped()
                    );
                }
                table
            }
            None => SynonymTable::empty(options.case_folding),
        };

        let layout = PayloadLayout::from_same_type_sequence(metadata.same_type_sequence.as_deref());

        info!(
            "StarDict dictionary opened: '{}', {} records, {} distinct headwords, {} synonyms, {} bytes of definitions",
            metadata.book_name,
            records.len(),
            search.len(),
            synonyms.len(),
            definitions.len()
        );

        Ok(Self {
            metadata,
            records,
            search,
            synonyms,
            layout,
            definitions,
        })
    }

    pub fn metadata(&self) -> &DictionaryMetadata {
        &self.metadata
    }

    /// Index records in file order.
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Returns the number of index records. This is an O(1) operation.
    pub fn word_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the number of accepted synonym entries.
    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }

    /// Looks up every entry for `word`.
    ///
    /// Headwords are matched first; when none matches, the synonym table is
    /// consulted. Entries come back in index order. A word that matches
    /// nothing yields an empty [`Lookup`], not an error.
    ///
    /// # Errors
    /// Storage failures (`Io`, `Decompression`) abort the lookup. Entries with
    /// corrupt payloads are reported in [`Lookup::failures`] instead.
    pub fn lookup(&self, word: &str) -> Result<Lookup> {
        let mut positions = self.search.exact_match(word);
        if positions.is_empty() {
            positions = self.synonyms.lookup(word);
            if !positions.is_empty() {
                debug!("'{}' resolved through synonyms to records {:?}", word, positions);
            }
        }
        self.materialize(positions.iter().copied())
    }

    /// Looks up every entry whose headword starts with `prefix`.
    ///
    /// At most `limit` records are read; `0` means no limit.
    pub fn lookup_predictive(&self, prefix: &str, limit: usize) -> Result<Lookup> {
        let positions = self
            .search
            .prefix_match(prefix)
            .flat_map(|(_, positions)| positions.iter().copied());
        if limit == 0 {
            self.materialize(positions)
        } else {
            self.materialize(positions.take(limit))
        }
    }

    /// Returns headwords starting with `prefix` in ascending key order.
    ///
    /// At most `limit` headwords are returned; `0` means no limit, which can
    /// be expensive for short prefixes on large dictionaries.
    pub fn prefix_search(&self, prefix: &str, limit: usize) -> Vec<String> {
        if limit == 0 && prefix.chars().count() < 2 {
            warn!(
                "Unbounded prefix search for {:?} may return most of the {} headwords",
                prefix,
                self.records.len()
            );
        }

        let mut headwords = Vec::new();
        for (_, positions) in self.search.prefix_match(prefix) {
            // Under case folding one key can stand for several spellings.
            let mut spellings: Vec<&str> = Vec::new();
            for record in positions.iter().filter_map(|&p| self.records.get(p)) {
                if !spellings.contains(&record.headword.as_str()) {
                    spellings.push(&record.headword);
                }
            }
            for spelling in spellings {
                if limit > 0 && headwords.len() >= limit {
                    return headwords;
                }
                headwords.push(spelling.to_string());
            }
        }
        headwords
    }

    /// Reads and decodes the record at `position` in index order.
    ///
    /// Format errors are wrapped as [`StardictError::Entry`] with the
    /// record's headword; storage errors are returned unchanged.
    pub fn read_entry(&self, position: usize) -> Result<DictionaryEntry> {
        let record = self.records.get(position).ok_or_else(|| {
            StardictError::InvalidFormat(format!("Record position {} is out of range", position))
        })?;
        self.decode_record(record).map_err(|e| {
            if e.is_format_error() {
                StardictError::for_entry(&record.headword, e)
            } else {
                e
            }
        })
    }

    /// Releases the underlying files by consuming the handle.
    ///
    /// Dropping the handle releases them too; this only makes the end of the
    /// handle's life explicit and logs it. It never fails.
    pub fn close(self) {
        info!("Closing StarDict dictionary: '{}'", self.metadata.book_name);
    }

    fn decode_record(&self, record: &IndexRecord) -> Result<DictionaryEntry> {
        let bytes = self
            .definitions
            .read_range(record.data_offset, u64::from(record.data_size))?;
        let segments = self.layout.decode(&bytes, self.metadata.encoding)?;
        Ok(DictionaryEntry {
            headword: record.headword.clone(),
            segments,
        })
    }

    /// Reads each position, collecting per-entry format failures.
    fn materialize(&self, positions: impl Iterator<Item = usize>) -> Result<Lookup> {
        let mut lookup = Lookup::default();
        for position in positions {
            match self.read_entry(position) {
                Ok(entry) => lookup.entries.push(entry),
                Err(e) if e.is_format_error() => {
                    warn!("{}", e);
                    lookup.failures.push(e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(lookup)
    }
}
