//! File format parsing layer for StarDict dictionaries.
//!
//! # Module Organization
//!
//! - [`ifo`]: Parses the `.ifo` metadata file
//! - [`index`]: Parses the `.idx` word index into ordered records
//! - [`payload`]: Splits definition payloads into typed segments
//!
//! # Architecture
//!
//! ```text
//! Dictionary Files:
//! ┌─────────────────┐
//! │  .ifo           │ ← ifo::parse()
//! ├─────────────────┤
//! │  .idx[.gz]      │ ← index::parse()
//! ├─────────────────┤
//! │  .syn[.gz]      │ ← synonyms::SynonymTable::parse()
//! ├─────────────────┤
//! │  .dict[.dz]     │ ← codec::BlockSource::read_range()
//! │                 │   then payload::PayloadLayout::decode()
//! └─────────────────┘
//! ```

pub mod ifo;
pub mod index;
pub mod payload;
