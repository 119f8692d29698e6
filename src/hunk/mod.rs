// Hunk framing: wire types, serialization, and the codec error taxonomy.
//
// The compressed stream is a sequence of self-delimited hunks.  Each hunk is
// a 4-byte little-endian payload length followed by subhunk records whose
// on-wire lengths sum to exactly that payload length.  A subhunk is:
//
//   control byte   high nibble seeds the literal-count VLL,
//                  low nibble seeds the (replay_len - 4) VLL
//   [escape bytes] literal-count VLL continuation, if the nibble was 15
//   literal bytes
//   rewind         2-byte LE, absent on the final subhunk when the hunk's
//                  payload is exhausted after the literals
//   [escape bytes] replay-length VLL continuation
//
// A hunk decodes to at most 65536 bytes, which is what keeps every rewind
// representable in 16 bits.

use thiserror::Error;

use crate::vll;

pub mod decoder;
pub mod encoder;

pub use decoder::decode_block;
pub use encoder::encode_block;

/// Hard cap on bytes a single hunk decodes to (the encoder's window size).
pub const WINDOW_MAX: usize = 65536;

/// Shortest replay the wire can express: the low control nibble stores
/// `replay_len - 4` as an unsigned VLL.
pub const MIN_REPLAY: u32 = 4;

/// Size of the payload-length prefix on every hunk.
pub const HUNK_HEADER_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A replay reference: copy `len` bytes starting `rewind` bytes back from
/// the current end of the hunk's decoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replay {
    pub rewind: u16,
    pub len: u32,
}

/// One literal-run-plus-optional-replay record.
///
/// Only the final subhunk of a hunk may omit the replay; the decoder detects
/// that case by the payload length being exhausted after the literal bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subhunk {
    pub literal: Vec<u8>,
    pub replay: Option<Replay>,
}

impl Subhunk {
    /// On-wire byte length of this record.
    pub fn wire_len(&self) -> usize {
        let mut n = 1 + vll::sizeof(self.literal.len() as u64) + self.literal.len();
        if let Some(replay) = self.replay {
            n += 2 + vll::sizeof(u64::from(replay.len.saturating_sub(MIN_REPLAY)));
        }
        n
    }

    /// Serialize this record, appending to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let replay_vll = match self.replay {
            Some(replay) => {
                if replay.len < MIN_REPLAY {
                    return Err(EncodeError::InvalidValue(replay.len));
                }
                u64::from(replay.len - MIN_REPLAY)
            }
            // No replay: the low nibble still has to be well formed, so it
            // carries the minimum legal value.
            None => 0,
        };
        let literal_len = self.literal.len() as u64;

        out.push((vll::nibble(literal_len) << 4) | vll::nibble(replay_vll));
        vll::push_escape(literal_len, out);
        out.extend_from_slice(&self.literal);

        if let Some(replay) = self.replay {
            out.extend_from_slice(&replay.rewind.to_le_bytes());
            vll::push_escape(replay_vll, out);
        }
        Ok(())
    }
}

/// Serialize a complete hunk: payload-length prefix plus all subhunks.
pub fn write_hunk(subhunks: &[Subhunk], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    debug_assert!(
        subhunks
            .iter()
            .rev()
            .skip(1)
            .all(|s| s.replay.is_some()),
        "only the final subhunk of a hunk may omit its replay"
    );
    let payload: usize = subhunks.iter().map(Subhunk::wire_len).sum();
    out.extend_from_slice(&(payload as u32).to_le_bytes());
    for subhunk in subhunks {
        subhunk.write_to(out)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A replay reference that is geometrically impossible given the bytes
/// decoded so far.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// `rewind` reaches back before the start of the hunk's output.
    #[error("rewind {rewind} reaches before the start of the hunk ({decoded} bytes decoded)")]
    NegativeWindowStart { rewind: u16, decoded: usize },
    /// The replay start is at or past the end of the decoded output
    /// (only a zero rewind can produce this).
    #[error("rewind {rewind} points at or past the end of decoded output ({decoded} bytes)")]
    WindowStartPastEnd { rewind: u16, decoded: usize },
}

/// Decode-side failures.  All are unrecoverable for the stream being
/// processed; no partial output is returned alongside them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The source ran out before a structurally required field.
    #[error("truncated input: {0}")]
    TruncatedInput(&'static str),
    /// A replay reference the decoded output cannot satisfy.
    #[error("corrupt stream: {0}")]
    CorruptStream(#[from] Corruption),
}

impl From<vll::VllError> for DecodeError {
    fn from(e: vll::VllError) -> Self {
        match e {
            vll::VllError::Truncated => DecodeError::TruncatedInput("VLL escape sequence"),
        }
    }
}

/// Encode-side contract violations.  These cannot occur for byte input fed
/// through [`encode_block`]; they guard direct users of the wire types.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A replay shorter than the format minimum has no wire representation.
    #[error("replay length {0} is below the format minimum of {MIN_REPLAY}")]
    InvalidValue(u32),
}

// ---------------------------------------------------------------------------
// Parallel batch helpers
// ---------------------------------------------------------------------------

// Archive entries are compressed independently, so batches may fan out across
// threads; the per-hunk state machine itself is strictly sequential.

/// Encode independent entries in parallel.
#[cfg(feature = "parallel")]
pub fn encode_blocks<B: AsRef<[u8]> + Sync>(blocks: &[B]) -> Vec<Vec<u8>> {
    use rayon::prelude::*;
    blocks
        .par_iter()
        .map(|raw| encode_block(raw.as_ref()))
        .collect()
}

/// Decode independent entries in parallel.  Each entry is a complete
/// compressed stream; its slice length is its `compressed_len`.
#[cfg(feature = "parallel")]
pub fn decode_blocks<B: AsRef<[u8]> + Sync>(blocks: &[B]) -> Result<Vec<Vec<u8>>, DecodeError> {
    use rayon::prelude::*;
    blocks
        .par_iter()
        .map(|c| {
            let c = c.as_ref();
            decode_block(c, c.len() as u64)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
