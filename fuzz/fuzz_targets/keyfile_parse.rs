#![no_main]

use attest_bulk::KeyRing;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Keyfile loading skips bad lines; it must never panic.
    if let Ok(text) = std::str::from_utf8(data) {
        let mut ring = KeyRing::new();
        let report = ring.load_str(text);
        assert_eq!(report.loaded, ring.len());
    }
});
