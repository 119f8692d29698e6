//! Hunklz: byte-exact codec for a hunk-framed LZ77 asset-archive format.
//!
//! The crate provides:
//! - The wire-format primitives and framing (`hunk`)
//! - The variable-length integer encoding (`vll`)
//! - The encoder's window occurrence index (`window`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! The format is a length-limited LZ77 variant: literal runs interleaved
//! with "replay" references into a 65536-byte sliding window, packed into
//! length-prefixed blocks ("hunks").  Compatibility is bit-for-bit with the
//! engine's original decoder; the stream layout must not be improved upon.
//!
//! # Quick Start
//!
//! ```
//! use hunklz::hunk::{decoder, encoder};
//!
//! let raw = b"the quick brown fox, the quick brown fox";
//! let compressed = encoder::encode_block(raw);
//! let decoded = decoder::decode_block(&compressed, compressed.len() as u64).unwrap();
//! assert_eq!(decoded, raw);
//! ```

pub mod hunk;
pub mod io;
pub mod vll;
pub mod window;

#[cfg(feature = "cli")]
pub mod cli;
