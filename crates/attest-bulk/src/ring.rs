//! The key ring session object

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use attest_core::address::account_id;
use attest_core::hashing::sha256;
use attest_core::signature::{recover_and_verify, sign_recoverable};
use attest_core::{normalize_private_key_hex, parse_secp_private_key};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::keyfile::{parse_lines, ParsedLine, SkippedLine};
use crate::KeyRingError;

/// One loaded key with its public identifiers.
pub struct KeyRecord {
    private_key_hex: String,
    secret: SecretKey,
    pub public_key_hex: String,
    pub account_id: String,
}

impl KeyRecord {
    fn new(normalized: String, secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
        Self {
            private_key_hex: normalized,
            secret,
            public_key_hex: hex::encode(public.serialize()),
            account_id: account_id(&public),
        }
    }

    /// Normalized private key hex (lower-case, no `0x`).
    pub fn private_key_hex(&self) -> &str {
        &self.private_key_hex
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::signing_only(), &self.secret)
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("private_key_hex", &"<redacted>")
            .field("public_key_hex", &self.public_key_hex)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Drop for KeyRecord {
    fn drop(&mut self) {
        self.private_key_hex.zeroize();
        self.secret.non_secure_erase();
    }
}

/// One signature produced by [`KeyRing::sign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub account_id: String,
    /// 65 bytes `r || s || v`, `v = 27 + recovery id`
    pub signature_hex: String,
    pub public_key_hex: String,
    pub message: String,
    /// SHA-256 of the UTF-8 message
    pub message_digest_hex: String,
}

/// A key that produced no signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKey {
    pub account_id: String,
    pub reason: String,
}

/// Summary of one load call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub duplicates: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Outcome of signing one message with every key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignReport {
    pub records: Vec<SignatureRecord>,
    pub skipped: Vec<SkippedKey>,
}

/// Deduplicated, ordered collection of signing keys.
///
/// Not meant for concurrent use; callers sharing a ring across threads
/// must serialize access themselves.
#[derive(Default)]
pub struct KeyRing {
    keys: Vec<KeyRecord>,
    // Normalized private key hex, for deduplication
    seen: HashSet<String>,
    signatures: Vec<SignatureRecord>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("keys", &self.keys)
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

impl Drop for KeyRing {
    fn drop(&mut self) {
        for mut key in self.seen.drain() {
            key.zeroize();
        }
    }
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Loaded keys in load order.
    pub fn keys(&self) -> &[KeyRecord] {
        &self.keys
    }

    /// Signatures from the most recent [`KeyRing::sign`] call.
    pub fn signatures(&self) -> &[SignatureRecord] {
        &self.signatures
    }

    /// Add one key. Returns `false` if it was already present.
    pub fn add_key(&mut self, key_hex: &str) -> Result<bool, KeyRingError> {
        let secret = parse_secp_private_key(key_hex)?;
        Ok(self.insert(normalize_private_key_hex(key_hex), secret))
    }

    fn insert(&mut self, mut normalized: String, mut secret: SecretKey) -> bool {
        if self.seen.contains(&normalized) {
            normalized.zeroize();
            secret.non_secure_erase();
            return false;
        }
        self.seen.insert(normalized.clone());
        self.keys.push(KeyRecord::new(normalized, secret));
        true
    }

    /// Load keys from keyfile text. Bad lines are skipped and reported.
    pub fn load_str(&mut self, text: &str) -> LoadReport {
        let mut report = LoadReport::default();
        for (line_no, parsed) in parse_lines(text) {
            match parsed {
                ParsedLine::Ignored => {}
                ParsedLine::Key { normalized, secret } => {
                    if self.insert(normalized, secret) {
                        report.loaded += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                ParsedLine::Invalid(reason) => {
                    log::debug!("keyfile line {} skipped: {}", line_no, reason);
                    report.skipped.push(SkippedLine { line_no, reason });
                }
            }
        }
        log::info!(
            "loaded {} keys ({} duplicates, {} lines skipped)",
            report.loaded,
            report.duplicates,
            report.skipped.len()
        );
        report
    }

    /// Load keys from a keyfile on disk.
    pub fn load_file(&mut self, path: &Path) -> Result<LoadReport, KeyRingError> {
        let text = fs::read_to_string(path).map_err(|source| KeyRingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load_str(&text))
    }

    /// Sign `message` with every key, replacing any earlier signatures.
    pub fn sign(&mut self, message: &str) -> Result<SignReport, KeyRingError> {
        if self.keys.is_empty() {
            return Err(KeyRingError::NoKeys);
        }

        let digest = sha256(message.as_bytes());
        let digest_hex = hex::encode(digest);
        let mut report = SignReport::default();

        for key in &self.keys {
            let sig = sign_recoverable(&digest, &key.secret);
            // Self-check: the signature must recover to the key that made it
            match recover_and_verify(&digest, &sig.compact, sig.recovery_id) {
                Ok(recovered) if recovered == key.public_key() => {
                    report.records.push(SignatureRecord {
                        account_id: key.account_id.clone(),
                        signature_hex: hex::encode(sig.to_rsv()),
                        public_key_hex: key.public_key_hex.clone(),
                        message: message.to_string(),
                        message_digest_hex: digest_hex.clone(),
                    });
                }
                Ok(_) => {
                    log::warn!("signature for {} recovered a different key", key.account_id);
                    report.skipped.push(SkippedKey {
                        account_id: key.account_id.clone(),
                        reason: "recovered key mismatch".into(),
                    });
                }
                Err(e) => {
                    log::warn!("signing with {} failed: {}", key.account_id, e);
                    report.skipped.push(SkippedKey {
                        account_id: key.account_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "signed with {} keys ({} skipped)",
            report.records.len(),
            report.skipped.len()
        );
        self.signatures = report.records.clone();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::signature::recover_public_key;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_TWO: &str = "0000000000000000000000000000000000000000000000000000000000000002";

    fn noisy_keyfile() -> String {
        format!(
            "# exported keys\n\n{one}\nthis is not a key\n0x{two}\n{upper}\n{zero}\n",
            one = KEY_ONE,
            two = KEY_TWO,
            upper = KEY_ONE.to_uppercase(),
            zero = "0".repeat(64),
        )
    }

    #[test]
    fn test_load_skips_noise_and_dedups() {
        let mut ring = KeyRing::new();
        let report = ring.load_str(&noisy_keyfile());

        assert_eq!(report.loaded, 2);
        assert_eq!(report.duplicates, 1);
        let skipped_lines: Vec<usize> = report.skipped.iter().map(|s| s.line_no).collect();
        assert_eq!(skipped_lines, vec![4, 7]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_order_follows_load_order() {
        let mut ring = KeyRing::new();
        ring.load_str(&format!("{}\n{}\n", KEY_TWO, KEY_ONE));
        assert_eq!(ring.keys()[0].private_key_hex(), KEY_TWO);
        assert_eq!(ring.keys()[1].private_key_hex(), KEY_ONE);

        let report = ring.sign("order").unwrap();
        assert_eq!(report.records[0].public_key_hex, ring.keys()[0].public_key_hex);
        assert_eq!(report.records[1].public_key_hex, ring.keys()[1].public_key_hex);
    }

    #[test]
    fn test_signatures_recover_to_signer() {
        let mut ring = KeyRing::new();
        ring.load_str(&noisy_keyfile());
        let report = ring.sign("attest").unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(report.skipped.is_empty());

        let digest = sha256(b"attest");
        for record in &report.records {
            assert_eq!(record.message, "attest");
            assert_eq!(record.message_digest_hex, hex::encode(digest));

            let sig = hex::decode(&record.signature_hex).unwrap();
            assert_eq!(sig.len(), 65);
            assert!(sig[64] == 27 || sig[64] == 28);

            let recovered = recover_public_key(&digest, &sig[..64], sig[64] - 27).unwrap();
            assert_eq!(hex::encode(recovered.serialize()), record.public_key_hex);
            assert_eq!(account_id(&recovered), record.account_id);
        }
    }

    #[test]
    fn test_resign_replaces_previous_records() {
        let mut ring = KeyRing::new();
        ring.add_key(KEY_ONE).unwrap();
        ring.sign("first").unwrap();
        ring.sign("second").unwrap();

        assert_eq!(ring.signatures().len(), 1);
        assert_eq!(ring.signatures()[0].message, "second");
    }

    #[test]
    fn test_signing_is_deterministic() {
        let mut ring = KeyRing::new();
        ring.add_key(KEY_ONE).unwrap();
        let a = ring.sign("same").unwrap();
        let b = ring.sign("same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_add_key_reports_duplicates_and_errors() {
        let mut ring = KeyRing::new();
        assert!(ring.add_key(KEY_ONE).unwrap());
        assert!(!ring.add_key(&format!("0x{}", KEY_ONE)).unwrap());
        assert!(matches!(
            ring.add_key("abc"),
            Err(KeyRingError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_ring_cannot_sign() {
        let mut ring = KeyRing::new();
        ring.load_str("# nothing here\n");
        assert!(matches!(ring.sign("msg"), Err(KeyRingError::NoKeys)));
    }

    #[test]
    fn test_load_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keys.txt");
        std::fs::write(&path, noisy_keyfile()).unwrap();

        let mut ring = KeyRing::new();
        let report = ring.load_file(&path).unwrap();
        assert_eq!(report.loaded, 2);

        let missing = ring.load_file(&tmp.path().join("missing.txt"));
        assert!(matches!(missing, Err(KeyRingError::Read { .. })));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let mut ring = KeyRing::new();
        ring.add_key(KEY_TWO).unwrap();
        let debug = format!("{:?}", ring.keys()[0]);
        assert!(!debug.contains(KEY_TWO));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_records_serialize_to_json() {
        let mut ring = KeyRing::new();
        ring.add_key(KEY_ONE).unwrap();
        let report = ring.sign("json").unwrap();
        let json = serde_json::to_string(&report.records).unwrap();
        let back: Vec<SignatureRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report.records);
    }
}
