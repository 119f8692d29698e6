// File-level helpers for whole-entry compression and extraction.
//
// The codec operates on single in-memory buffers (archive entries are
// small), so these helpers read the input fully, run the codec, and write
// the result through a buffered writer.  A standalone compressed file's
// length *is* its `compressed_len`, the same convention the extraction
// tooling uses when an entry is carved out of the container.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::hunk::{self, DecodeError, decoder, encoder};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by [`encode_file`].
#[derive(Debug, Clone)]
pub struct EncodeStats {
    /// Raw input size in bytes.
    pub raw_size: u64,
    /// Compressed output size in bytes.
    pub compressed_size: u64,
    /// Number of hunks written.
    pub hunks: u64,
}

/// Statistics returned by [`decode_file`].
#[derive(Debug, Clone)]
pub struct DecodeStats {
    /// Compressed input size in bytes.
    pub compressed_size: u64,
    /// Decoded output size in bytes.
    pub raw_size: u64,
    /// Number of hunks decoded.
    pub hunks: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stream decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// encode_file / decode_file
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024;

/// Compress `input_path` into `output_path`.
pub fn encode_file(input_path: &Path, output_path: &Path) -> Result<EncodeStats, IoError> {
    let raw = std::fs::read(input_path)?;
    let mut encoder = encoder::Encoder::new();
    encoder.push_all(&raw);
    let compressed = encoder.finish();
    let hunks = encoder.hunks();

    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    writer.write_all(&compressed)?;
    writer.flush()?;

    Ok(EncodeStats {
        raw_size: raw.len() as u64,
        compressed_size: compressed.len() as u64,
        hunks,
    })
}

/// Decompress `input_path` into `output_path`.
///
/// `compressed_len` defaults to the whole input file; pass a value when the
/// file carries trailing bytes that are not part of the stream.
pub fn decode_file(
    input_path: &Path,
    output_path: &Path,
    compressed_len: Option<u64>,
) -> Result<DecodeStats, IoError> {
    let compressed = std::fs::read(input_path)?;
    let compressed_len = compressed_len.unwrap_or(compressed.len() as u64);

    let raw = decoder::decode_block(&compressed, compressed_len)?;
    let hunks = decoder::scan(&compressed, compressed_len)?.len() as u64;

    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    writer.write_all(&raw)?;
    writer.flush()?;

    Ok(DecodeStats {
        compressed_size: compressed_len,
        raw_size: raw.len() as u64,
        hunks,
    })
}

/// Structural summary of a compressed file, for inspection tooling.
pub fn scan_file(input_path: &Path) -> Result<Vec<hunk::decoder::HunkInfo>, IoError> {
    let compressed = std::fs::read(input_path)?;
    Ok(decoder::scan(&compressed, compressed.len() as u64)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
