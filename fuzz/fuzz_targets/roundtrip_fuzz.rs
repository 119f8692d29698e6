#![no_main]
use libfuzzer_sys::fuzz_target;
use hunklz::hunk::{decoder, encoder};

fuzz_target!(|data: &[u8]| {
    let compressed = encoder::encode_block(data);
    let decoded = decoder::decode_block(&compressed, compressed.len() as u64)
        .expect("encoder output must decode");
    assert_eq!(decoded, data, "roundtrip mismatch");
});
