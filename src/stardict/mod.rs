//! Core StarDict reader module

pub mod codec;
pub mod files;
pub mod format;
pub mod reader;
pub mod search;
pub mod synonyms;
pub mod types;
mod utils;

pub use reader::StarDict;
pub use types::error::{StardictError, Result};
