//! Codec layer for compressed and uncompressed definition data.
//!
//! # Submodules
//!
//! - [`compression`][]: Whole-file gzip and single dictzip chunk inflation
//! - [`source`][]: The [`BlockSource`] trait plus plain-file and in-memory sources
//! - [`dictzip`][]: Chunked random access into `.dict.dz` files

pub mod compression;
pub mod dictzip;
pub mod source;

pub use dictzip::DictZipSource;
pub use source::{BlockSource, MemorySource, PlainSource};
