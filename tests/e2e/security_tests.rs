//! Security-specific tests.
//!
//! These tests verify:
//! 1. Malformed manifests and bundles are rejected without panicking
//! 2. Secrets never show up in Debug output or manifests
//! 3. Hostile keyfiles and blobs are skipped, not fatal
//! 4. Random noise, even noise shaped like signatures, never matches a target

use attest_bulk::{KeyRing, KeyRingError};
use attest_core::{derive_keys, parse_hrp, DigestScheme, KeyError};
use attest_forensics::{extract_chunks, MessageDictionary, Scanner};
use attest_forge::verify::verify_manifest_bytes;
use attest_forge::{forge, verify_bundle, ClaimManifest, ForgeError, ManifestParams, SignatureBundle};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

fn params() -> ManifestParams {
    let mut params = ManifestParams::new(parse_hrp("bc").unwrap());
    params.timestamp = Some("2024-01-01T00:00:00Z".into());
    params
}

/// Deterministic pseudo-random bytes for noise tests.
fn noise(len: usize, label: &[u8]) -> Vec<u8> {
    let mut state = attest_core::hashing::sha256(label);
    let mut out = Vec::with_capacity(len + 32);
    while out.len() < len {
        state = attest_core::hashing::sha256(&state);
        out.extend_from_slice(&state);
    }
    out.truncate(len);
    out
}

// ============================================================================
// 1. Malformed inputs
// ============================================================================

#[test]
fn test_manifest_with_extra_field_rejected() {
    let out = forge("test-seed-alpha", &params(), DigestScheme::Sha256).unwrap();
    let mut value = serde_json::to_value(&out.manifest).unwrap();
    value["injected"] = serde_json::json!("extra");
    let bytes = serde_json::to_vec(&value).unwrap();
    assert!(matches!(
        ClaimManifest::from_json(&bytes),
        Err(ForgeError::Json(_))
    ));
}

#[test]
fn test_garbage_files_do_not_panic() {
    let random = noise(512, b"garbage json");
    let inputs: [&[u8]; 6] = [
        b"",
        b"{",
        b"null",
        b"[]",
        b"{\"manifest\": 5}",
        random.as_slice(),
    ];
    for input in inputs {
        assert!(ClaimManifest::from_json(input).is_err());
        assert!(SignatureBundle::from_json(input).is_err());
    }
}

#[test]
fn test_hostile_signature_fields_fail_cleanly() {
    let out = forge("test-seed-alpha", &params(), DigestScheme::Sha256).unwrap();
    let hostile: Vec<String> = vec![
        String::new(),
        "00".into(),
        "zz".into(),
        "0".repeat(128),
        "f".repeat(128),
        "ab".repeat(1000),
    ];
    for value in hostile {
        let mut bundle = out.bundle.clone();
        bundle.signatures.curve_a_signature_hex = value.clone();
        bundle.signatures.curve_b_signature_hex = value.clone();
        let report = verify_bundle(&out.manifest, &bundle).unwrap();
        assert!(!report.accepted(), "accepted hostile signature {:?}", value);
    }
}

#[test]
fn test_declared_key_garbage_fails_cleanly() {
    let out = forge("test-seed-alpha", &params(), DigestScheme::Sha256).unwrap();
    let report = verify_manifest_bytes(
        &out.manifest_bytes,
        "02zz",
        "",
        &out.bundle.signatures,
        None,
    );
    assert!(!report.accepted());
    assert_eq!(report.failures().count(), 2);
}

#[test]
fn test_bitcoin_message_digest_refused_for_manifests() {
    assert!(matches!(
        forge("test-seed-alpha", &params(), DigestScheme::BitcoinMessage),
        Err(ForgeError::UnsupportedDigest(_))
    ));

    let out = forge("test-seed-alpha", &params(), DigestScheme::Sha256).unwrap();
    let mut bundle = out.bundle.clone();
    bundle.signatures.digest_algorithm_tag = "bitcoin-message".into();
    assert!(!verify_bundle(&out.manifest, &bundle).unwrap().accepted());
}

// ============================================================================
// 2. Secret hygiene
// ============================================================================

#[test]
fn test_seed_never_lands_in_artifacts() {
    let seed = "very secret seed phrase 8f2a";
    let out = forge(seed, &params(), DigestScheme::Sha256).unwrap();

    let manifest = String::from_utf8(out.manifest_bytes.clone()).unwrap();
    let bundle = String::from_utf8(out.bundle.to_json_pretty().unwrap()).unwrap();
    assert!(!manifest.contains(seed));
    assert!(!bundle.contains(seed));
    assert!(out.manifest.anchor_phrase.starts_with("seed-sha256:"));
}

#[test]
fn test_derived_keys_debug_is_redacted() {
    let keys = derive_keys("test-seed-alpha").unwrap();
    let secret_hex = hex::encode(keys.secp_secret_key().secret_bytes());
    let ed_hex = hex::encode(keys.ed25519_signing_key().to_bytes());

    let debug = format!("{:?}", keys);
    assert!(!debug.contains(&secret_hex));
    assert!(!debug.contains(&ed_hex));
}

#[test]
fn test_key_ring_debug_is_redacted() {
    let key = "3333333333333333333333333333333333333333333333333333333333333333";
    let mut ring = KeyRing::new();
    ring.add_key(key).unwrap();
    assert!(!format!("{:?}", ring).contains(key));
}

#[test]
fn test_empty_seed_rejected() {
    assert!(matches!(derive_keys(""), Err(KeyError::EmptySeed)));
}

// ============================================================================
// 3. Hostile keyfiles
// ============================================================================

#[test]
fn test_binary_keyfile_loads_nothing() {
    let junk = String::from_utf8_lossy(&noise(16 * 1024, b"keyfile junk")).into_owned();
    let mut ring = KeyRing::new();
    let report = ring.load_str(&junk);
    assert_eq!(report.loaded, 0);
    assert!(matches!(ring.sign("anything"), Err(KeyRingError::NoKeys)));
}

#[test]
fn test_out_of_range_scalars_skipped() {
    // Zero, the curve order n, and n + 1
    let text = "\
0000000000000000000000000000000000000000000000000000000000000000
fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141
fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364142
fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140
";
    let mut ring = KeyRing::new();
    let report = ring.load_str(text);
    assert_eq!(report.loaded, 1);
    let skipped: Vec<usize> = report.skipped.iter().map(|s| s.line_no).collect();
    assert_eq!(skipped, vec![1, 2, 3]);
}

// ============================================================================
// 4. Forensic noise
// ============================================================================

#[test]
fn test_random_bytes_yield_no_proofs() {
    let scanner = Scanner::new(MessageDictionary::with_defaults(), parse_hrp("bc").unwrap());
    for round in 0..8u8 {
        let bytes = noise(32 * 1024, &[b'n', round]);
        let blob = String::from_utf8_lossy(&bytes);
        let report = scanner.scan(&blob);
        assert!(report.proofs.is_empty(), "round {} produced a proof", round);
    }
}

#[test]
fn test_random_signature_chunks_never_match_targets() {
    let target_key = derive_keys("test-seed-alpha").unwrap();
    let target = attest_core::AddressSet::derive(&target_key.secp_public_key(), parse_hrp("bc").unwrap())
        .unwrap()
        .legacy_address;
    let targeted = Scanner::new(MessageDictionary::with_defaults(), parse_hrp("bc").unwrap())
        .with_targets([target]);
    let untargeted = Scanner::new(MessageDictionary::with_defaults(), parse_hrp("bc").unwrap());

    // Random r || s framed as wallet signatures, buried in log lines
    let blob: String = (0..8u8)
        .map(|i| {
            let mut framed = vec![31 + i % 4];
            framed.extend_from_slice(&noise(64, &[b's', i]));
            format!("line {} sig: {}\n", i, STANDARD.encode(framed))
        })
        .collect();

    let report = targeted.scan(&blob);
    assert_eq!(report.chunks_decoded, 8);
    assert!(report.proofs.is_empty());

    // Without targets the same noise is reported; those hits prove nothing
    let report = untargeted.scan(&blob);
    assert_eq!(report.chunks_decoded, 8);
    assert!(report.proofs.len() <= report.chunks_decoded);
}

#[test]
fn test_pathological_blobs_do_not_panic() {
    let long_run = "A".repeat(100_000);
    let padding = "=".repeat(10_000);
    let mixed = "A=".repeat(10_000);
    let unicode = "∇⊸≋∇".repeat(5_000);
    for blob in [long_run.as_str(), padding.as_str(), mixed.as_str(), unicode.as_str()] {
        let _ = extract_chunks(blob);
    }
    assert_eq!(extract_chunks(&long_run).len(), 100_000 / 88);
}
