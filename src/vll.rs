// VLL: the codec's variable-length unsigned integer encoding.
//
// A value is seeded by a 4-bit nibble packed into a subhunk control byte.
// Nibbles 0..=14 are the value itself and consume no further bytes.
// Nibble 15 opens a byte-escape sequence: each byte is *added* to the
// running value, and the sequence ends at the first byte that is not 255.
// The terminating byte is included in the sum, so e.g. value 270 encodes
// as nibble 15 followed by the single escape byte 255 and then 0.

use thiserror::Error;

/// Nibble value that opens a byte-escape sequence.
pub const ESCAPE_NIBBLE: u8 = 0x0F;

/// Largest value a bare nibble can carry.
pub const NIBBLE_MAX: u64 = 14;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VllError {
    /// The escape sequence ran past the end of the input.
    #[error("truncated VLL escape sequence")]
    Truncated,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a VLL value seeded by `first_nibble`, reading escape bytes from
/// `data`. Returns `(value, bytes_consumed)`.
///
/// `bytes_consumed` counts only the escape bytes; the control byte holding
/// the nibble has already been consumed by the caller.
pub fn decode(first_nibble: u8, data: &[u8]) -> Result<(u64, usize), VllError> {
    debug_assert!(first_nibble <= 0x0F, "nibble out of range");
    let mut value = u64::from(first_nibble);
    if first_nibble != ESCAPE_NIBBLE {
        return Ok((value, 0));
    }
    for (i, &byte) in data.iter().enumerate() {
        value += u64::from(byte);
        if byte != 0xFF {
            return Ok((value, i + 1));
        }
    }
    Err(VllError::Truncated)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// The nibble that seeds the encoding of `value`.
#[inline]
pub fn nibble(value: u64) -> u8 {
    value.min(u64::from(ESCAPE_NIBBLE)) as u8
}

/// Append the escape bytes for `value` to `out`.
///
/// Appends nothing for values that fit in a bare nibble. Every escape byte
/// is 255 except the final one, which absorbs the remainder (possibly 0).
pub fn push_escape(value: u64, out: &mut Vec<u8>) {
    if value <= NIBBLE_MAX {
        return;
    }
    let mut rest = value - u64::from(ESCAPE_NIBBLE);
    while rest >= 0xFF {
        out.push(0xFF);
        rest -= 0xFF;
    }
    out.push(rest as u8);
}

/// Encode `value`, appending escape bytes to `out` and returning the seed
/// nibble for the caller to pack into a control byte.
#[inline]
pub fn encode(value: u64, out: &mut Vec<u8>) -> u8 {
    push_escape(value, out);
    nibble(value)
}

/// Number of escape bytes `value` encodes to (0 for bare-nibble values).
#[inline]
pub fn sizeof(value: u64) -> usize {
    if value <= NIBBLE_MAX {
        0
    } else {
        1 + ((value - u64::from(ESCAPE_NIBBLE)) / 0xFF) as usize
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
