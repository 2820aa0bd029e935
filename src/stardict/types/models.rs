//! Core data structures for StarDict format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Dictionary metadata parsed from the `.ifo` file
//! - Index records and decoded entries
//! - Version, offset width and content type enumerations

use encoding_rs::Encoding;
use super::error::{StardictError, Result};

/// StarDict format versions accepted by this reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V2_4_2,
    V3_0_0,
}

impl FormatVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::V2_4_2 => "2.4.2",
            FormatVersion::V3_0_0 => "3.0.0",
        }
    }
}

impl TryFrom<&str> for FormatVersion {
    type Error = StardictError;
    fn try_from(v: &str) -> Result<Self> {
        match v.trim() {
            "2.4.2" => Ok(Self::V2_4_2),
            "3.0.0" => Ok(Self::V3_0_0),
            other => Err(StardictError::UnsupportedVersion(other.to_string())),
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of the `data_offset` field of each `.idx` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetBits {
    #[default]
    Bits32,
    Bits64,
}

impl OffsetBits {
    /// Returns the byte width of the offset field.
    ///
    /// - Bits32: 4 bytes (u32)
    /// - Bits64: 8 bytes (u64)
    pub fn number_width(&self) -> usize {
        match self {
            OffsetBits::Bits32 => 4,
            OffsetBits::Bits64 => 8,
        }
    }
}

impl TryFrom<u32> for OffsetBits {
    type Error = StardictError;
    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(StardictError::InvalidOffsetBits(other)),
        }
    }
}

/// Content type tag of one payload segment.
///
/// Lowercase tags carry text and are delimited by a `\0` terminator.
/// Uppercase tags carry binary data prefixed by a 32-bit big-endian length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Word's pure text meaning.
    Meaning,
    /// Text in the locale's encoding.
    Locale,
    /// Pango text markup.
    Pango,
    /// English phonetic string.
    Phonetic,
    /// XDXF markup.
    Xdxf,
    /// Chinese YinBiao or Japanese KANA.
    YinBiao,
    /// KingSoft PowerWord XML data.
    PowerWord,
    /// MediaWiki markup.
    MediaWiki,
    /// HTML.
    Html,
    /// WordNet data.
    WordNet,
    /// Resource file list.
    Resource,
    /// WAV sound file.
    Wav,
    /// Picture image.
    Picture,
    /// Reserved for experimental extensions.
    Experimental,
}

impl EntryType {
    pub fn tag(&self) -> char {
        match self {
            EntryType::Meaning => 'm',
            EntryType::Locale => 'l',
            EntryType::Pango => 'g',
            EntryType::Phonetic => 't',
            EntryType::Xdxf => 'x',
            EntryType::YinBiao => 'y',
            EntryType::PowerWord => 'k',
            EntryType::MediaWiki => 'w',
            EntryType::Html => 'h',
            EntryType::WordNet => 'n',
            EntryType::Resource => 'r',
            EntryType::Wav => 'W',
            EntryType::Picture => 'P',
            EntryType::Experimental => 'X',
        }
    }

    /// Binary types are length-prefixed, text types are `\0`-terminated.
    pub fn is_binary(&self) -> bool {
        self.tag().is_ascii_uppercase()
    }

    /// Parses a `sametypesequence` value such as `"tm"` into its tags.
    pub fn parse_sequence(sequence: &str) -> Result<Vec<EntryType>> {
        if sequence.is_empty() {
            return Err(StardictError::InvalidFormat("Empty sametypesequence".to_string()));
        }
        sequence.chars().map(EntryType::try_from).collect()
    }
}

impl TryFrom<char> for EntryType {
    type Error = StardictError;
    fn try_from(tag: char) -> Result<Self> {
        match tag {
            'm' => Ok(Self::Meaning),
            'l' => Ok(Self::Locale),
            'g' => Ok(Self::Pango),
            't' => Ok(Self::Phonetic),
            'x' => Ok(Self::Xdxf),
            'y' => Ok(Self::YinBiao),
            'k' => Ok(Self::PowerWord),
            'w' => Ok(Self::MediaWiki),
            'h' => Ok(Self::Html),
            'n' => Ok(Self::WordNet),
            'r' => Ok(Self::Resource),
            'W' => Ok(Self::Wav),
            'P' => Ok(Self::Picture),
            'X' => Ok(Self::Experimental),
            _ => Err(StardictError::InvalidFormat(format!("Unknown entry type tag: {:?}", tag))),
        }
    }
}

/// Metadata parsed from the `.ifo` file.
///
/// Immutable once loaded; configures the index parser and the payload decoder.
#[derive(Debug, Clone)]
pub struct DictionaryMetadata {
    pub version: FormatVersion,
    pub book_name: String,
    /// Declared number of `.idx` records.
    pub word_count: u64,
    /// Declared number of `.syn` entries, if the dictionary has a synonym file.
    pub syn_word_count: Option<u64>,
    /// Declared size in bytes of the uncompressed `.idx` file.
    pub idx_file_size: Option<u64>,
    pub idx_offset_bits: OffsetBits,
    /// `None` when every payload segment carries its own type tag.
    pub same_type_sequence: Option<Vec<EntryType>>,
    /// Text encoding of headwords and text segments. StarDict mandates UTF-8.
    pub encoding: &'static Encoding,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub dict_type: Option<String>,
}

impl DictionaryMetadata {
    /// Minimal metadata for a dictionary assembled in memory.
    pub fn new(version: FormatVersion, book_name: impl Into<String>, word_count: u64) -> Self {
        Self {
            version,
            book_name: book_name.into(),
            word_count,
            syn_word_count: None,
            idx_file_size: None,
            idx_offset_bits: OffsetBits::Bits32,
            same_type_sequence: None,
            encoding: encoding_rs::UTF_8,
            author: None,
            email: None,
            website: None,
            description: None,
            date: None,
            dict_type: None,
        }
    }
}

/// A single record of the `.idx` file.
///
/// Records are kept in file order; their position is what the synonym
/// file refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub headword: String,
    /// Byte offset of the payload in the uncompressed definition blob.
    pub data_offset: u64,
    /// Byte length of the payload.
    pub data_size: u32,
}

/// Decoded content of one payload segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentContent {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub entry_type: EntryType,
    pub content: SegmentContent,
}

impl Segment {
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            SegmentContent::Text(text) => Some(text),
            SegmentContent::Binary(_) => None,
        }
    }
}

/// One fully decoded dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub headword: String,
    pub segments: Vec<Segment>,
}

impl DictionaryEntry {
    /// Returns the first text segment, which for most dictionaries is the article.
    pub fn text(&self) -> Option<&str> {
        self.segments.iter().find_map(Segment::as_text)
    }
}

/// Result of a single query.
///
/// Entries that failed to decode do not abort the query; they are reported in
/// `failures`, each wrapped as [`StardictError::Entry`].
#[derive(Debug, Default)]
pub struct Lookup {
    pub entries: Vec<DictionaryEntry>,
    pub failures: Vec<StardictError>,
}

impl Lookup {
    /// `true` when nothing matched: neither entries nor failures.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.failures.is_empty()
    }
}
