// Hunk decoder: parses the compressed stream and reconstructs raw bytes.
//
// Byte-for-byte compatible with the engine's own decoder.  The replay copy
// appends one byte at a time while reading, so self-overlapping references
// (rewind smaller than replay length) reproduce repeating patterns exactly.
//
// The stream carries no end marker: the caller supplies `compressed_len`
// (the archive container records it per entry) and decoding consumes whole
// hunks until that many wire bytes are used up.

use log::{debug, trace};

use super::{Corruption, DecodeError, HUNK_HEADER_LEN};
use crate::vll;

// ---------------------------------------------------------------------------
// Block decoding
// ---------------------------------------------------------------------------

/// Decode `compressed_len` bytes' worth of hunks from `input`, returning the
/// concatenated decoded bytes.
///
/// Bytes in `input` beyond `compressed_len` are ignored.  On error nothing
/// is returned; the output buffer never escapes partially filled.
pub fn decode_block(input: &[u8], compressed_len: u64) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    let mut consumed: u64 = 0;
    let mut hunks: u64 = 0;
    while consumed < compressed_len {
        let used = decode_hunk_into(&input[consumed as usize..], &mut out)?;
        consumed += used as u64;
        hunks += 1;
    }
    if consumed != compressed_len {
        // The reference decoder stops on whole-hunk boundaries too; a
        // mismatch means the container's length field was off.
        debug!("hunk stream ran {} bytes past compressed_len", consumed - compressed_len);
    }
    debug!("decoded {} hunks, {} bytes total", hunks, out.len());
    Ok(out)
}

/// Decode a single hunk from the front of `input`.
///
/// Returns the decoded bytes and the number of wire bytes consumed,
/// including the 4-byte payload-length prefix.
pub fn decode_hunk(input: &[u8]) -> Result<(Vec<u8>, usize), DecodeError> {
    let mut out = Vec::new();
    let used = decode_hunk_into(input, &mut out)?;
    Ok((out, used))
}

/// Decode one hunk, appending to `out`.  Returns wire bytes consumed.
///
/// Replay rewinds are relative to this hunk's own output only, so the bytes
/// already in `out` from previous hunks are never referenced.
pub fn decode_hunk_into(input: &[u8], out: &mut Vec<u8>) -> Result<usize, DecodeError> {
    let header: [u8; HUNK_HEADER_LEN] = input
        .get(..HUNK_HEADER_LEN)
        .ok_or(DecodeError::TruncatedInput("hunk length prefix"))?
        .try_into()
        .unwrap();
    let payload_len = u64::from(u32::from_le_bytes(header));

    let base = out.len();
    let mut pos = HUNK_HEADER_LEN;
    let mut consumed: u64 = 0;

    while consumed < payload_len {
        let ctrl = *input
            .get(pos)
            .ok_or(DecodeError::TruncatedInput("subhunk control byte"))?;
        pos += 1;
        consumed += 1;

        let (literal_count, escape_len) = vll::decode(ctrl >> 4, &input[pos..])?;
        pos += escape_len;
        consumed += escape_len as u64;

        if literal_count > (input.len() - pos) as u64 {
            return Err(DecodeError::TruncatedInput("literal bytes"));
        }
        let literal_count = literal_count as usize;
        out.extend_from_slice(&input[pos..pos + literal_count]);
        pos += literal_count;
        consumed += literal_count as u64;

        if consumed >= payload_len {
            // Terminal subhunk: the rewind/replay fields are absent.
            trace!("subhunk: {} literal bytes, no replay", literal_count);
            break;
        }

        let rewind_bytes: [u8; 2] = input
            .get(pos..pos + 2)
            .ok_or(DecodeError::TruncatedInput("replay rewind"))?
            .try_into()
            .unwrap();
        let rewind = u16::from_le_bytes(rewind_bytes);
        pos += 2;
        consumed += 2;

        let (replay_vll, escape_len) = vll::decode(ctrl & 0x0F, &input[pos..])?;
        pos += escape_len;
        consumed += escape_len as u64;
        let replay_len = replay_vll + u64::from(super::MIN_REPLAY);

        let decoded = out.len() - base;
        if usize::from(rewind) > decoded {
            return Err(Corruption::NegativeWindowStart { rewind, decoded }.into());
        }
        if rewind == 0 {
            return Err(Corruption::WindowStartPastEnd { rewind, decoded }.into());
        }
        let start = out.len() - usize::from(rewind);

        trace!(
            "subhunk: {} literal bytes, {} replay bytes starting {} from the end",
            literal_count, replay_len, rewind
        );

        let replay_len = replay_len as usize;
        if start + replay_len <= out.len() {
            // Non-overlapping: bulk copy.
            out.extend_from_within(start..start + replay_len);
        } else {
            // Overlapping: byte-at-a-time so each read can see bytes this
            // same replay just appended.
            for i in 0..replay_len {
                let byte = out[start + i];
                out.push(byte);
            }
        }
    }

    Ok(pos)
}

// ---------------------------------------------------------------------------
// Structural scan (no output materialization)
// ---------------------------------------------------------------------------

/// Shape of one hunk found by [`scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkInfo {
    /// Wire offset of the hunk's length prefix.
    pub offset: usize,
    /// Payload length from the prefix (excludes the prefix itself).
    pub payload_len: u32,
    /// Bytes the hunk decodes to.
    pub decoded_len: u64,
    /// Number of subhunk records.
    pub subhunks: u32,
}

/// Walk the hunk structure of a compressed stream without decoding any
/// payload bytes.  Performs the same framing and replay-geometry validation
/// as [`decode_block`].
pub fn scan(input: &[u8], compressed_len: u64) -> Result<Vec<HunkInfo>, DecodeError> {
    let mut infos = Vec::new();
    let mut consumed: u64 = 0;
    while consumed < compressed_len {
        let offset = consumed as usize;
        let info = scan_hunk(&input[offset..], offset)?;
        consumed += u64::from(info.payload_len) + HUNK_HEADER_LEN as u64;
        infos.push(info);
    }
    Ok(infos)
}

fn scan_hunk(input: &[u8], offset: usize) -> Result<HunkInfo, DecodeError> {
    let header: [u8; HUNK_HEADER_LEN] = input
        .get(..HUNK_HEADER_LEN)
        .ok_or(DecodeError::TruncatedInput("hunk length prefix"))?
        .try_into()
        .unwrap();
    let payload_len = u32::from_le_bytes(header);

    let mut pos = HUNK_HEADER_LEN;
    let mut consumed: u64 = 0;
    let mut decoded_len: u64 = 0;
    let mut subhunks: u32 = 0;

    while consumed < u64::from(payload_len) {
        let ctrl = *input
            .get(pos)
            .ok_or(DecodeError::TruncatedInput("subhunk control byte"))?;
        pos += 1;
        consumed += 1;

        let (literal_count, escape_len) = vll::decode(ctrl >> 4, &input[pos..])?;
        pos += escape_len;
        consumed += escape_len as u64;

        if literal_count > (input.len() - pos) as u64 {
            return Err(DecodeError::TruncatedInput("literal bytes"));
        }
        pos += literal_count as usize;
        consumed += literal_count;
        decoded_len += literal_count;
        subhunks += 1;

        if consumed >= u64::from(payload_len) {
            break;
        }

        let rewind_bytes: [u8; 2] = input
            .get(pos..pos + 2)
            .ok_or(DecodeError::TruncatedInput("replay rewind"))?
            .try_into()
            .unwrap();
        let rewind = u16::from_le_bytes(rewind_bytes);
        pos += 2;
        consumed += 2;

        let (replay_vll, escape_len) = vll::decode(ctrl & 0x0F, &input[pos..])?;
        pos += escape_len;
        consumed += escape_len as u64;

        let decoded = decoded_len as usize;
        if u64::from(rewind) > decoded_len {
            return Err(Corruption::NegativeWindowStart { rewind, decoded }.into());
        }
        if rewind == 0 {
            return Err(Corruption::WindowStartPastEnd { rewind, decoded }.into());
        }
        decoded_len += replay_vll + u64::from(super::MIN_REPLAY);
    }

    Ok(HunkInfo {
        offset,
        payload_len,
        decoded_len,
        subhunks,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_literal_subhunk() {
        // payload 2: ctrl 0x10 (one literal, minimum replay nibble), 0x7F.
        let wire = [0x02, 0x00, 0x00, 0x00, 0x10, 0x7F];
        let (out, used) = decode_hunk(&wire).unwrap();
        assert_eq!(out, [0x7F]);
        assert_eq!(used, wire.len());
    }

    #[test]
    fn overlapping_replay_repeats_pattern() {
        // Literal "A", then replay 4 bytes with rewind 1: "AAAAA".
        let wire = [0x04, 0x00, 0x00, 0x00, 0x10, b'A', 0x01, 0x00];
        let (out, used) = decode_hunk(&wire).unwrap();
        assert_eq!(out, b"AAAAA");
        assert_eq!(used, wire.len());
    }

    #[test]
    fn non_overlapping_replay() {
        // Literal "abcd", replay 4 with rewind 4, then terminal literal "XY".
        let wire = [
            0x0A, 0x00, 0x00, 0x00, 0x40, b'a', b'b', b'c', b'd', 0x04, 0x00, 0x20, b'X', b'Y',
        ];
        let (out, used) = decode_hunk(&wire).unwrap();
        assert_eq!(out, b"abcdabcdXY");
        assert_eq!(used, wire.len());
    }

    #[test]
    fn escaped_literal_count() {
        // 20 literal bytes: high nibble 15, escape byte 5.
        let mut wire = vec![0x16, 0x00, 0x00, 0x00, 0xF0, 0x05];
        wire.extend(0u8..20);
        let (out, used) = decode_hunk(&wire).unwrap();
        assert_eq!(out, (0u8..20).collect::<Vec<_>>());
        assert_eq!(used, wire.len());
    }

    #[test]
    fn block_concatenates_hunks() {
        let mut wire = vec![0x02, 0x00, 0x00, 0x00, 0x10, 0x7F];
        wire.extend([0x04, 0x00, 0x00, 0x00, 0x10, b'A', 0x01, 0x00]);
        let out = decode_block(&wire, wire.len() as u64).unwrap();
        assert_eq!(out, b"\x7FAAAAA");
    }

    #[test]
    fn compressed_len_inside_final_hunk_decodes_it_whole() {
        // Decoding consumes whole hunks: a compressed_len that lands in the
        // middle of the final hunk still yields that hunk's full output,
        // exactly as the engine's decoder behaves when the container's
        // length field undershoots.
        let mut wire = vec![0x02, 0x00, 0x00, 0x00, 0x10, 0x7F];
        wire.extend([0x04, 0x00, 0x00, 0x00, 0x10, b'A', 0x01, 0x00]);
        // First hunk is 6 wire bytes; 8 points 2 bytes into the second.
        let out = decode_block(&wire, 8).unwrap();
        assert_eq!(out, b"\x7FAAAAA");
    }

    #[test]
    fn rewind_does_not_cross_hunk_boundary() {
        // Second hunk opens with a replay before any of its own output;
        // the first hunk's bytes must not satisfy it.
        let mut wire = vec![0x02, 0x00, 0x00, 0x00, 0x10, 0x7F];
        wire.extend([0x03, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
        let err = decode_block(&wire, wire.len() as u64).unwrap_err();
        assert_eq!(
            err,
            DecodeError::CorruptStream(Corruption::NegativeWindowStart {
                rewind: 1,
                decoded: 0
            })
        );
    }

    #[test]
    fn excessive_rewind_is_corrupt() {
        // One literal byte, then a replay rewinding 2.
        let wire = [0x05, 0x00, 0x00, 0x00, 0x10, 0x7F, 0x02, 0x00];
        let err = decode_hunk(&wire).unwrap_err();
        assert_eq!(
            err,
            DecodeError::CorruptStream(Corruption::NegativeWindowStart {
                rewind: 2,
                decoded: 1
            })
        );
    }

    #[test]
    fn zero_rewind_is_corrupt() {
        let wire = [0x05, 0x00, 0x00, 0x00, 0x10, 0x7F, 0x00, 0x00];
        let err = decode_hunk(&wire).unwrap_err();
        assert_eq!(
            err,
            DecodeError::CorruptStream(Corruption::WindowStartPastEnd {
                rewind: 0,
                decoded: 1
            })
        );
    }

    #[test]
    fn truncation_points_are_detected() {
        // Missing prefix bytes.
        assert_eq!(
            decode_hunk(&[0x05, 0x00]).unwrap_err(),
            DecodeError::TruncatedInput("hunk length prefix")
        );
        // Prefix promises a payload the input lacks.
        assert_eq!(
            decode_hunk(&[0x05, 0x00, 0x00, 0x00]).unwrap_err(),
            DecodeError::TruncatedInput("subhunk control byte")
        );
        // Literal run cut short.
        assert_eq!(
            decode_hunk(&[0x05, 0x00, 0x00, 0x00, 0x30, b'a']).unwrap_err(),
            DecodeError::TruncatedInput("literal bytes")
        );
        // Rewind field cut short.
        assert_eq!(
            decode_hunk(&[0x05, 0x00, 0x00, 0x00, 0x10, b'a', 0x01]).unwrap_err(),
            DecodeError::TruncatedInput("replay rewind")
        );
        // VLL escape cut short.
        assert_eq!(
            decode_hunk(&[0x09, 0x00, 0x00, 0x00, 0x1F, b'a', 0x01, 0x00, 0xFF]).unwrap_err(),
            DecodeError::TruncatedInput("VLL escape sequence")
        );
    }

    #[test]
    fn empty_block() {
        assert_eq!(decode_block(&[], 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn scan_reports_structure_without_decoding() {
        let mut wire = vec![0x02, 0x00, 0x00, 0x00, 0x10, 0x7F];
        wire.extend([
            0x0A, 0x00, 0x00, 0x00, 0x40, b'a', b'b', b'c', b'd', 0x04, 0x00, 0x20, b'X', b'Y',
        ]);
        let infos = scan(&wire, wire.len() as u64).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].offset, 0);
        assert_eq!(infos[0].payload_len, 2);
        assert_eq!(infos[0].decoded_len, 1);
        assert_eq!(infos[0].subhunks, 1);
        assert_eq!(infos[1].offset, 6);
        assert_eq!(infos[1].payload_len, 10);
        assert_eq!(infos[1].decoded_len, 10);
        assert_eq!(infos[1].subhunks, 2);
    }

    #[test]
    fn scan_rejects_what_decode_rejects() {
        let wire = [0x05, 0x00, 0x00, 0x00, 0x10, 0x7F, 0x02, 0x00];
        assert_eq!(
            scan(&wire, wire.len() as u64).unwrap_err(),
            decode_block(&wire, wire.len() as u64).unwrap_err()
        );
    }
}
