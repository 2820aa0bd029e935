//! Companion file discovery.
//!
//! Given `name.ifo`, the other files of a dictionary share its base name:
//! `name.idx.gz` or `name.idx`, optionally `name.syn.gz` or `name.syn`, and
//! `name.dict.dz` or `name.dict`. Compressed variants win when both exist.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::stardict::types::error::{StardictError, Result};

/// Paths of the companion files of one dictionary.
#[derive(Debug, Clone)]
pub struct DictionaryFiles {
    pub idx: PathBuf,
    pub syn: Option<PathBuf>,
    pub dict: PathBuf,
}

impl DictionaryFiles {
    pub fn locate(ifo_path: &Path) -> Result<Self> {
        let base = match ifo_path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("ifo") => ifo_path.with_extension(""),
            _ => ifo_path.to_path_buf(),
        };

        let idx = find_first(&base, &[".idx.gz", ".idx"])
            .ok_or_else(|| StardictError::MissingFile(".idx".to_string()))?;
        let syn = find_first(&base, &[".syn.gz", ".syn"]);
        let dict = find_first(&base, &[".dict.dz", ".dict"])
            .ok_or_else(|| StardictError::MissingFile(".dict.dz or .dict".to_string()))?;

        debug!(
            "Dictionary files: idx={}, syn={:?}, dict={}",
            idx.display(),
            syn.as_deref().map(Path::display),
            dict.display()
        );
        Ok(Self {
            idx,
            syn,
            dict,
        })
    }

    /// `true` when the definition blob is dictzip-compressed.
    pub fn dict_is_dictzip(&self) -> bool {
        self.dict
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dz"))
    }
}

fn find_first(base: &Path, suffixes: &[&str]) -> Option<PathBuf> {
    suffixes.iter().find_map(|suffix| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        let path = PathBuf::from(name);
        path.is_file().then_some(path)
    })
}
