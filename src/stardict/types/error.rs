//! Custom error types for the stardict-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum StardictError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The dictionary version declared in the `.ifo` file is not supported.
    #[error("Unsupported StarDict version: {0}. Only 2.4.2 and 3.0.0 are supported.")]
    UnsupportedVersion(String),

    /// `idxoffsetbits` declared a width other than 32 or 64.
    #[error("Unsupported idxoffsetbits: {0}. Only 32 and 64 are supported.")]
    InvalidOffsetBits(u32),

    /// A compressed stream was truncated or corrupt.
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// A declared count of items does not match the actual number of items found.
    #[error("Count mismatch for {item_type}: expected {expected}, but found {found}")]
    CountMismatch {
        item_type: &'static str,
        expected: u64,
        found: u64,
    },

    /// The input is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A required companion file (.idx, .dict) could not be found next to the .ifo file.
    #[error("No {0} file found for dictionary")]
    MissingFile(String),

    /// A single entry's payload could not be read or decoded.
    ///
    /// Returned inside [`Lookup::failures`](crate::Lookup) rather than aborting the lookup.
    #[error("Failed to decode entry '{headword}': {source}")]
    Entry {
        headword: String,
        #[source]
        source: Box<StardictError>,
    },

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl StardictError {
    /// Wraps an error with the headword of the entry it belongs to.
    pub fn for_entry(headword: impl Into<String>, source: StardictError) -> Self {
        StardictError::Entry {
            headword: headword.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` for structurally invalid input, `false` for storage failures.
    pub fn is_format_error(&self) -> bool {
        match self {
            StardictError::Io(_) | StardictError::Decompression(_) | StardictError::LockPoisoned => {
                false
            }
            StardictError::Entry { source, .. } => source.is_format_error(),
            _ => true,
        }
    }
}

/// A convenience `Result` type alias using the crate's `StardictError` type.
pub type Result<T> = std::result::Result<T, StardictError>;
