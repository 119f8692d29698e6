// Property tests: encoder/decoder agreement on arbitrary payloads, and
// structural invariants of every stream the encoder emits.

use hunklz::hunk::{MIN_REPLAY, WINDOW_MAX, decoder, encoder};
use hunklz::vll;
use proptest::prelude::*;

/// One replay reference as it appears on the wire.
#[derive(Debug)]
struct WireReplay {
    rewind: u16,
    len: u64,
    decoded_before: u64,
}

/// Walk a compressed stream and collect every replay reference, along
/// with the per-hunk decoded sizes.  Panics on malformed input; the
/// encoder under test must never produce that.
fn walk_stream(stream: &[u8]) -> (Vec<WireReplay>, Vec<u64>) {
    let mut replays = Vec::new();
    let mut hunk_sizes = Vec::new();
    let mut pos = 0usize;

    while pos < stream.len() {
        let payload_len =
            u32::from_le_bytes(stream[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let hunk_end = pos + payload_len;
        let mut decoded = 0u64;

        while pos < hunk_end {
            let ctrl = stream[pos];
            pos += 1;

            let (literal_len, used) = vll::decode(ctrl >> 4, &stream[pos..]).unwrap();
            pos += used;
            pos += literal_len as usize;
            decoded += literal_len;

            if pos >= hunk_end {
                break;
            }

            let rewind = u16::from_le_bytes(stream[pos..pos + 2].try_into().unwrap());
            pos += 2;
            let (extra, used) = vll::decode(ctrl & 0x0F, &stream[pos..]).unwrap();
            pos += used;
            let len = extra + u64::from(MIN_REPLAY);

            replays.push(WireReplay {
                rewind,
                len,
                decoded_before: decoded,
            });
            decoded += len;
        }

        assert_eq!(pos, hunk_end, "subhunk overran its hunk");
        hunk_sizes.push(decoded);
    }
    (replays, hunk_sizes)
}

proptest! {
    #[test]
    fn roundtrip_arbitrary(raw in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let compressed = encoder::encode_block(&raw);
        let decoded = decoder::decode_block(&compressed, compressed.len() as u64).unwrap();
        prop_assert_eq!(decoded, raw);
    }

    #[test]
    fn roundtrip_small_alphabet(raw in proptest::collection::vec(0u8..4, 0..8192)) {
        // Heavily repetitive input exercises the match path and
        // self-overlapping replays.
        let compressed = encoder::encode_block(&raw);
        let decoded = decoder::decode_block(&compressed, compressed.len() as u64).unwrap();
        prop_assert_eq!(decoded, raw);
    }

    #[test]
    fn emitted_streams_are_structurally_sound(
        raw in proptest::collection::vec(0u8..16, 0..8192),
    ) {
        let compressed = encoder::encode_block(&raw);
        let (replays, hunk_sizes) = walk_stream(&compressed);

        for r in &replays {
            // A rewind of zero would start the copy past the end of the
            // decoded output; the encoder can never emit it.
            prop_assert!(r.rewind >= 1);
            prop_assert!(u64::from(r.rewind) <= r.decoded_before);
            prop_assert!(r.len >= u64::from(MIN_REPLAY));
        }
        for &size in &hunk_sizes {
            prop_assert!(size <= WINDOW_MAX as u64);
        }
        prop_assert_eq!(hunk_sizes.iter().sum::<u64>(), raw.len() as u64);
    }

    #[test]
    fn vll_roundtrip(value in 0u64..2_000_000) {
        let mut buf = Vec::new();
        let seed = vll::encode(value, &mut buf);
        let (decoded, used) = vll::decode(seed, &buf).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(used, buf.len());
        prop_assert_eq!(vll::sizeof(value), buf.len());
    }

    #[test]
    fn scan_matches_decode(raw in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let compressed = encoder::encode_block(&raw);
        let infos = decoder::scan(&compressed, compressed.len() as u64).unwrap();
        let total: u64 = infos.iter().map(|i| i.decoded_len).sum();
        prop_assert_eq!(total, raw.len() as u64);
    }
}
