#![no_main]

use attest_forensics::extract::{MAX_CHUNK_CHARS, MAX_PADDING, MIN_CHUNK_CHARS};
use attest_forensics::{decode_chunk, extract_chunks};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let blob = String::from_utf8_lossy(data);
    for chunk in extract_chunks(&blob) {
        assert!(chunk.text.len() >= MIN_CHUNK_CHARS);
        assert!(chunk.text.len() <= MAX_CHUNK_CHARS + MAX_PADDING);
        let _ = decode_chunk(chunk.text);
    }
});
