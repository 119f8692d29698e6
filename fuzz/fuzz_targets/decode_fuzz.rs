#![no_main]
use libfuzzer_sys::fuzz_target;
use hunklz::hunk::decoder;

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic on arbitrary bytes, only return errors.
    let _ = decoder::decode_block(data, data.len() as u64);
    let _ = decoder::scan(data, data.len() as u64);

    // Also exercise the tolerant-overshoot path with a shorter claimed
    // length.
    if !data.is_empty() {
        let _ = decoder::decode_block(data, (data.len() / 2) as u64);
    }
});
