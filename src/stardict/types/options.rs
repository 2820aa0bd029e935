//! Open-time configuration for a dictionary handle.

use encoding_rs::Encoding;

use crate::stardict::types::error::{StardictError, Result};
use crate::stardict::utils;

/// Default number of decompressed dictzip chunks kept in memory.
///
/// Dictzip chunks are usually ~58 KiB, so this bounds the cache around 2 MiB.
pub const DEFAULT_CHUNK_CACHE_CAPACITY: usize = 32;

/// Case policy applied to headwords, synonyms and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Keys are matched exactly as stored.
    #[default]
    Sensitive,
    /// Keys and queries are lowercased before insertion and lookup.
    Insensitive,
}

impl CaseFolding {
    /// Maps a key through the active normalization.
    pub fn normalize<'a>(&self, key: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            CaseFolding::Sensitive => std::borrow::Cow::Borrowed(key),
            CaseFolding::Insensitive => std::borrow::Cow::Owned(key.to_lowercase()),
        }
    }
}

/// Options controlling how a dictionary is opened.
///
/// ```
/// use stardict_reader::{CaseFolding, OpenOptions};
///
/// let options = OpenOptions::new()
///     .case_folding(CaseFolding::Insensitive)
///     .chunk_cache_capacity(64);
/// assert_eq!(options.case_folding, CaseFolding::Insensitive);
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub case_folding: CaseFolding,
    /// Overrides the UTF-8 text encoding StarDict mandates. Useful for
    /// legacy dictionaries built with locale encodings.
    pub encoding: Option<&'static Encoding>,
    /// Number of decompressed dictzip chunks to cache. `0` disables caching.
    pub chunk_cache_capacity: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            case_folding: CaseFolding::Sensitive,
            encoding: None,
            chunk_cache_capacity: DEFAULT_CHUNK_CACHE_CAPACITY,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_folding(mut self, case_folding: CaseFolding) -> Self {
        self.case_folding = case_folding;
        self
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Like [`encoding`](Self::encoding), resolving a WHATWG label such as
    /// `"gbk"` or `"windows-1251"`.
    pub fn encoding_label(self, label: &str) -> Result<Self> {
        let encoding = utils::parse_encoding(label).ok_or_else(|| {
            StardictError::InvalidFormat(format!("Unknown text encoding label '{}'", label))
        })?;
        Ok(self.encoding(encoding))
    }

    pub fn chunk_cache_capacity(mut self, capacity: usize) -> Self {
        self.chunk_cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_label_resolves_aliases() {
        let options = OpenOptions::new().encoding_label(" GBK ").unwrap();
        assert_eq!(options.encoding, Some(encoding_rs::GBK));
        assert!(OpenOptions::new().encoding_label("klingon").is_err());
    }

    #[test]
    fn insensitive_folding_lowercases() {
        assert_eq!(CaseFolding::Insensitive.normalize("Ärger"), "ärger");
        assert_eq!(CaseFolding::Sensitive.normalize("Ärger"), "Ärger");
    }
}
