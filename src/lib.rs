//! # stardict-reader
//!
//! A read-only reader for StarDict dictionaries (`.ifo`, `.idx[.gz]`,
//! `.dict[.dz]`, optional `.syn[.gz]`).
//!
//! The word index is loaded into memory once; definitions are read on
//! demand, inflating only the dictzip chunks a lookup touches.
//!
//! ```no_run
//! use stardict_reader::{OpenOptions, StarDict};
//!
//! let dict = StarDict::open("latin-francais.ifo", &OpenOptions::new()).unwrap();
//! for entry in dict.lookup("testudo").unwrap().entries {
//!     println!("{}: {}", entry.headword, entry.text().unwrap_or_default());
//! }
//! ```
pub mod stardict;

// Re-export the main types for convenience
pub use stardict::{
    StarDict,
    codec::{BlockSource, DictZipSource, MemorySource, PlainSource},
    types::{
        error::{Result, StardictError},
        models::{
            DictionaryEntry,
            DictionaryMetadata,
            EntryType,
            FormatVersion,
            IndexRecord,
            Lookup,
            OffsetBits,
            Segment,
            SegmentContent,
        },
        options::{CaseFolding, OpenOptions},
    },
};
