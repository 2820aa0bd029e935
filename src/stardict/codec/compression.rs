//! Decompression primitives for StarDict files.
//!
//! StarDict uses two flavours of deflate:
//! - Whole-file gzip (`.idx.gz`, `.syn.gz`): decompressed in one pass, across
//!   every member
//! - Dictzip chunks (`.dict.dz`): raw deflate segments ended by a full flush,
//!   each independently inflatable

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use log::{debug, trace};

use crate::stardict::types::error::{StardictError, Result};

/// Reads a file, transparently decompressing it when its name ends in `.gz` or `.dz`.
///
/// Used for index and synonym files, which are always parsed in full.
/// Concatenated gzip members (as written by `pigz`) are read back to back.
pub fn read_maybe_gzip(path: &Path) -> Result<Vec<u8>> {
    let compressed = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz") || e.eq_ignore_ascii_case("dz"));

    let file = File::open(path)?;
    let mut buf = Vec::new();
    if compressed {
        debug!("Decompressing {} as gzip", path.display());
        MultiGzDecoder::new(BufReader::new(file))
            .read_to_end(&mut buf)
            .map_err(|e| {
                StardictError::Decompression(format!("gzip {}: {}", path.display(), e))
            })?;
    } else {
        BufReader::new(file).read_to_end(&mut buf)?;
    }
    debug!("Read {} bytes from {}", buf.len(), path.display());
    Ok(buf)
}

/// Inflates a single dictzip chunk into `output`.
///
/// Chunks other than the last end with a full flush rather than a final
/// deflate block, so the stream is drained with sync flushes until the
/// input stops making progress.
///
/// # Validation
/// The inflated chunk must be exactly `expected_size` bytes long.
pub fn inflate_chunk_into(
    output: &mut Vec<u8>,
    payload: &[u8],
    expected_size: usize,
) -> Result<()> {
    output.clear();
    // One spare byte so an oversized chunk is detected.
    output.reserve(expected_size + 1);
    trace!(
        "Inflating dictzip chunk: {} bytes -> {} bytes (max)",
        payload.len(),
        expected_size
    );

    let mut decompress = Decompress::new(false);
    loop {
        let consumed = decompress.total_in() as usize;
        let produced = decompress.total_out();
        let status = decompress
            .decompress_vec(&payload[consumed..], output, FlushDecompress::Sync)
            .map_err(|e| StardictError::Decompression(format!("Deflate chunk failed: {}", e)))?;

        let stalled =
            decompress.total_in() as usize == consumed && decompress.total_out() == produced;
        if status == Status::StreamEnd || output.len() > expected_size || stalled {
            break;
        }
    }

    if output.len() != expected_size {
        return Err(StardictError::Decompression(format!(
            "Chunk inflated to {} bytes, expected {}",
            output.len(),
            expected_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};

    fn deflate(data: &[u8], flush: FlushCompress) -> Vec<u8> {
        let mut compress = Compress::new(Compression::default(), false);
        let mut out = Vec::with_capacity(data.len() + 1024);
        compress.compress_vec(data, &mut out, flush).unwrap();
        out
    }

    #[test]
    fn full_flushed_chunk_without_final_block_inflates() {
        let data = b"first chunk of a dictzip blob, not the last one".repeat(4);
        let chunk = deflate(&data, FlushCompress::Full);

        let mut out = Vec::new();
        inflate_chunk_into(&mut out, &chunk, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn finished_chunk_inflates() {
        let data = b"last chunk".to_vec();
        let chunk = deflate(&data, FlushCompress::Finish);

        let mut out = Vec::new();
        inflate_chunk_into(&mut out, &chunk, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn size_mismatch_is_a_decompression_error() {
        let chunk = deflate(b"twelve bytes", FlushCompress::Full);

        let mut out = Vec::new();
        assert!(matches!(
            inflate_chunk_into(&mut out, &chunk, 20),
            Err(StardictError::Decompression(_))
        ));
        assert!(matches!(
            inflate_chunk_into(&mut out, &chunk, 5),
            Err(StardictError::Decompression(_))
        ));
    }
}
