//! The recovery search
//!
//! For each decoded chunk the search walks messages, then digest schemes,
//! then recovery ids, and stops at the first combination whose recovered
//! key verifies the signature. Every well-formed signature recovers *some*
//! key for any digest, so without targets the first message tried wins;
//! with targets only keys matching one of them count.
//!
//! Untargeted results carry no authenticity guarantee: any 65 random bytes
//! that decode as a signature yield a "proof" for the first message tried.
//! Only a targeted hit ties a chunk to a known key.

use attest_core::address::{encode_legacy, legacy_address_uncompressed, AddressSet};
use attest_core::hashing::hash160;
use attest_core::signature::recover_and_verify;
use attest_core::{AddressError, DigestScheme, Hrp};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::extract::{decode_chunk, extract_chunks, SIGNATURE_LEN};
use crate::messages::MessageDictionary;
use crate::recovery::{header_is_uncompressed, recovery_candidates};

/// Address forms derived from a recovered key.
///
/// `btc_legacy` follows the key encoding the header announces: the
/// uncompressed point for headers 27..=30, the compressed point otherwise.
/// Both legacy forms are always reported. The witness form is always
/// compressed since segwit v0 requires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdVariants {
    pub eth: String,
    pub btc_legacy: String,
    pub btc_legacy_compressed: String,
    pub btc_legacy_uncompressed: String,
    pub btc_witness: String,
}

impl AccountIdVariants {
    pub fn derive(pubkey: &PublicKey, hrp: Hrp, uncompressed: bool) -> Result<Self, AddressError> {
        let set = AddressSet::derive(pubkey, hrp)?;
        let legacy_uncompressed = legacy_address_uncompressed(pubkey);
        let btc_legacy = if uncompressed {
            legacy_uncompressed.clone()
        } else {
            set.legacy_address.clone()
        };
        Ok(Self {
            eth: set.account_id,
            btc_legacy,
            btc_legacy_compressed: set.legacy_address,
            btc_legacy_uncompressed: legacy_uncompressed,
            btc_witness: set.witness_address,
        })
    }

    fn matches(&self, target: &str) -> bool {
        target.eq_ignore_ascii_case(&self.eth)
            || target == self.btc_legacy_compressed
            || target == self.btc_legacy_uncompressed
            || target.eq_ignore_ascii_case(&self.btc_witness)
    }
}

/// A signature chunk that validated under one message, digest and recovery id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredProof {
    pub source_chunk_index: usize,
    pub digest_scheme: DigestScheme,
    pub message_candidate: String,
    /// Compressed public key
    pub recovered_pubkey_hex: String,
    pub account_id_variants: AccountIdVariants,
    pub recovery_id_used: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub chunks_found: usize,
    pub chunks_decoded: usize,
    pub proofs: Vec<RecoveredProof>,
    /// Fingerprint of every decoded signature in order, see [`chain_fingerprint`]
    pub attestation_address: Option<String>,
}

/// Legacy-style address over a signature chain: Base58Check of
/// HASH160(sig_0 || sig_1 || ...). Identifies the exact set and order of
/// signatures, not a key. `None` for an empty chain.
pub fn chain_fingerprint(signatures: &[[u8; SIGNATURE_LEN]]) -> Option<String> {
    if signatures.is_empty() {
        return None;
    }
    let joined = signatures.concat();
    Some(encode_legacy(&hash160(&joined)))
}

/// Scanner configuration: messages, witness hrp and optional targets.
#[derive(Debug, Clone)]
pub struct Scanner {
    messages: MessageDictionary,
    hrp: Hrp,
    targets: Vec<String>,
}

impl Scanner {
    pub fn new(messages: MessageDictionary, hrp: Hrp) -> Self {
        Self {
            messages,
            hrp,
            targets: Vec::new(),
        }
    }

    /// Only accept keys whose pubkey hex or any address form matches a target.
    ///
    /// Account ids and pubkeys compare case-insensitively.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn messages(&self) -> &MessageDictionary {
        &self.messages
    }

    /// Scan a blob. Never fails: unusable chunks are skipped.
    pub fn scan(&self, blob: &str) -> ScanReport {
        let chunks = extract_chunks(blob);
        let mut report = ScanReport {
            chunks_found: chunks.len(),
            ..Default::default()
        };

        let mut decoded = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let Some(signature) = decode_chunk(chunk.text) else {
                log::debug!("chunk {} at offset {} is not a 65-byte value", index, chunk.offset);
                continue;
            };
            report.chunks_decoded += 1;
            decoded.push(signature);

            match self.search_chunk(index, &signature) {
                Some(proof) => {
                    log::debug!(
                        "chunk {} recovered {} via {}",
                        index,
                        proof.recovered_pubkey_hex,
                        proof.digest_scheme
                    );
                    report.proofs.push(proof);
                }
                None => log::debug!("chunk {} matched nothing", index),
            }
        }

        report.attestation_address = chain_fingerprint(&decoded);

        log::info!(
            "scanned {} chunks ({} decoded), {} proofs",
            report.chunks_found,
            report.chunks_decoded,
            report.proofs.len()
        );
        report
    }

    /// First validating combination for one decoded signature.
    pub fn search_chunk(
        &self,
        index: usize,
        signature: &[u8; SIGNATURE_LEN],
    ) -> Option<RecoveredProof> {
        let compact = &signature[1..];
        let candidates = recovery_candidates(signature[0]);
        let uncompressed = header_is_uncompressed(signature[0]);

        for message in self.messages.messages() {
            for scheme in DigestScheme::ALL {
                // Schemes that cannot digest this message are skipped
                let Some(digest) = scheme.digest(message.as_bytes()) else {
                    continue;
                };
                for &recovery_id in &candidates {
                    let Ok(pubkey) = recover_and_verify(&digest, compact, recovery_id) else {
                        continue;
                    };
                    let Some(variants) = self.accept(&pubkey, uncompressed) else {
                        continue;
                    };
                    return Some(RecoveredProof {
                        source_chunk_index: index,
                        digest_scheme: scheme,
                        message_candidate: message.clone(),
                        recovered_pubkey_hex: hex::encode(pubkey.serialize()),
                        account_id_variants: variants,
                        recovery_id_used: recovery_id,
                    });
                }
            }
        }
        None
    }

    fn accept(&self, pubkey: &PublicKey, uncompressed: bool) -> Option<AccountIdVariants> {
        let variants = match AccountIdVariants::derive(pubkey, self.hrp, uncompressed) {
            Ok(variants) => variants,
            Err(e) => {
                log::debug!("address derivation failed: {}", e);
                return None;
            }
        };
        if self.targets.is_empty() || self.matches_target(pubkey, &variants) {
            Some(variants)
        } else {
            None
        }
    }

    fn matches_target(&self, pubkey: &PublicKey, variants: &AccountIdVariants) -> bool {
        let compressed_hex = hex::encode(pubkey.serialize());
        let uncompressed_hex = hex::encode(pubkey.serialize_uncompressed());
        self.targets.iter().any(|target| {
            target.eq_ignore_ascii_case(&compressed_hex)
                || target.eq_ignore_ascii_case(&uncompressed_hex)
                || variants.matches(target)
        })
    }
}
