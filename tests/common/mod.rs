#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::{Compress, Compression, Crc, FlushCompress, Status};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A dictionary written to a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub ifo: PathBuf,
}

/// Writes the files of a small StarDict dictionary.
pub struct DictBuilder {
    name: &'static str,
    version: &'static str,
    same_type_sequence: Option<&'static str>,
    offset_bits_64: bool,
    entries: Vec<(String, Vec<u8>)>,
    synonyms: Vec<(String, u32)>,
    word_count: Option<u64>,
    gzip_index: bool,
    gzip_synonyms: bool,
    dictzip_chunk_len: Option<usize>,
}

impl DictBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            version: "2.4.2",
            same_type_sequence: Some("m"),
            offset_bits_64: false,
            entries: Vec::new(),
            synonyms: Vec::new(),
            word_count: None,
            gzip_index: false,
            gzip_synonyms: false,
            dictzip_chunk_len: None,
        }
    }

    pub fn version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub fn same_type_sequence(mut self, seq: Option<&'static str>) -> Self {
        self.same_type_sequence = seq;
        self
    }

    pub fn offset_bits_64(mut self) -> Self {
        self.offset_bits_64 = true;
        self
    }

    pub fn entry(mut self, headword: &str, payload: impl AsRef<[u8]>) -> Self {
        self.entries.push((headword.to_string(), payload.as_ref().to_vec()));
        self
    }

    pub fn synonym(mut self, word: &str, position: u32) -> Self {
        self.synonyms.push((word.to_string(), position));
        self
    }

    pub fn word_count(mut self, count: u64) -> Self {
        self.word_count = Some(count);
        self
    }

    pub fn gzip_index(mut self) -> Self {
        self.gzip_index = true;
        self
    }

    pub fn gzip_synonyms(mut self) -> Self {
        self.gzip_synonyms = true;
        self
    }

    pub fn dictzip(mut self, chunk_len: usize) -> Self {
        self.dictzip_chunk_len = Some(chunk_len);
        self
    }

    /// Returns the uncompressed `.idx` bytes and the definition blob.
    pub fn index_and_blob(&self) -> (Vec<u8>, Vec<u8>) {
        let mut idx = Vec::new();
        let mut blob = Vec::new();
        for (headword, payload) in &self.entries {
            idx.extend_from_slice(headword.as_bytes());
            idx.push(0);
            if self.offset_bits_64 {
                idx.extend_from_slice(&(blob.len() as u64).to_be_bytes());
            } else {
                idx.extend_from_slice(&(blob.len() as u32).to_be_bytes());
            }
            idx.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            blob.extend_from_slice(payload);
        }
        (idx, blob)
    }

    pub fn synonym_bytes(&self) -> Vec<u8> {
        let mut syn = Vec::new();
        for (word, position) in &self.synonyms {
            syn.extend_from_slice(word.as_bytes());
            syn.push(0);
            syn.extend_from_slice(&position.to_be_bytes());
        }
        syn
    }

    pub fn build(self) -> Fixture {
        let dir = tempfile::tempdir().expect("create temp dir");
        let base = dir.path().join(self.name);
        let (idx, blob) = self.index_and_blob();

        let mut ifo = String::from("StarDict's dict ifo file\n");
        ifo.push_str(&format!("version={}\n", self.version));
        ifo.push_str(&format!("bookname={} test dictionary\n", self.name));
        ifo.push_str(&format!(
            "wordcount={}\n",
            self.word_count.unwrap_or(self.entries.len() as u64)
        ));
        ifo.push_str(&format!("idxfilesize={}\n", idx.len()));
        if self.offset_bits_64 {
            ifo.push_str("idxoffsetbits=64\n");
        }
        if !self.synonyms.is_empty() {
            ifo.push_str(&format!("synwordcount={}\n", self.synonyms.len()));
        }
        if let Some(seq) = self.same_type_sequence {
            ifo.push_str(&format!("sametypesequence={}\n", seq));
        }
        let ifo_path = with_suffix(&base, ".ifo");
        fs::write(&ifo_path, ifo).expect("write ifo");

        if self.gzip_index {
            fs::write(with_suffix(&base, ".idx.gz"), gzip(&idx)).expect("write idx.gz");
        } else {
            fs::write(with_suffix(&base, ".idx"), &idx).expect("write idx");
        }

        if !self.synonyms.is_empty() {
            let syn = self.synonym_bytes();
            if self.gzip_synonyms {
                fs::write(with_suffix(&base, ".syn.gz"), gzip(&syn)).expect("write syn.gz");
            } else {
                fs::write(with_suffix(&base, ".syn"), &syn).expect("write syn");
            }
        }

        match self.dictzip_chunk_len {
            Some(chunk_len) => fs::write(with_suffix(&base, ".dict.dz"), dictzip(&blob, chunk_len))
                .expect("write dict.dz"),
            None => fs::write(with_suffix(&base, ".dict"), &blob).expect("write dict"),
        }

        Fixture { dir, ifo: ifo_path }
    }
}

pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Compresses `data` in the dictzip layout: independent raw deflate chunks
/// of `chunk_len` uncompressed bytes, indexed by an "RA" gzip extra field.
pub fn dictzip(data: &[u8], chunk_len: usize) -> Vec<u8> {
    let mut compress = Compress::new(Compression::default(), false);
    let pieces: Vec<&[u8]> = data.chunks(chunk_len).collect();
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    for (i, piece) in pieces.iter().enumerate() {
        let last = i + 1 == pieces.len();
        let flush = if last { FlushCompress::Finish } else { FlushCompress::Full };
        let mut out = Vec::new();
        let mut consumed = 0usize;
        loop {
            out.reserve(piece.len() + 1024);
            let before = compress.total_in();
            let status = compress
                .compress_vec(&piece[consumed..], &mut out, flush)
                .expect("deflate chunk");
            consumed += (compress.total_in() - before) as usize;
            let flushed = if last {
                status == Status::StreamEnd
            } else {
                out.len() < out.capacity()
            };
            if consumed == piece.len() && flushed {
                break;
            }
        }
        assert!(out.len() <= u16::MAX as usize, "chunk too large for dictzip table");
        chunks.push(out);
    }

    let mut extra = Vec::new();
    extra.extend_from_slice(b"RA");
    extra.extend_from_slice(&((6 + 2 * chunks.len()) as u16).to_le_bytes());
    extra.extend_from_slice(&1u16.to_le_bytes());
    extra.extend_from_slice(&(chunk_len as u16).to_le_bytes());
    extra.extend_from_slice(&(chunks.len() as u16).to_le_bytes());
    for chunk in &chunks {
        extra.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
    }

    // FEXTRA | FNAME
    let mut out = vec![0x1f, 0x8b, 8, 0x04 | 0x08, 0, 0, 0, 0, 0, 3];
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&extra);
    out.extend_from_slice(b"test.dict\0");
    for chunk in &chunks {
        out.extend_from_slice(chunk);
    }
    let mut crc = Crc::new();
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out
}

/// Text of the first segment of every entry.
pub fn texts(lookup: &stardict_reader::Lookup) -> Vec<String> {
    lookup
        .entries
        .iter()
        .map(|e| e.text().unwrap_or_default().to_string())
        .collect()
}
