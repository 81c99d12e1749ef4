#![no_main]

use attest_forge::{verify_bundle, ClaimManifest, SignatureBundle};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bundles must parse or fail cleanly, and verifying one
    // against its own embedded manifest must never panic.
    if let Ok(bundle) = SignatureBundle::from_json(data) {
        let _ = verify_bundle(&bundle.manifest, &bundle);
    }
    let _ = ClaimManifest::from_json(data);
});
