//! Dual-curve signing of manifest bytes
//!
//! One digest of the canonical manifest is signed twice: a recoverable
//! secp256k1 signature (curve A) and an Ed25519 signature (curve B). The
//! digest scheme is recorded so verification never has to guess it.

use attest_core::signature::{sign_ed25519, sign_recoverable};
use attest_core::{DerivedKeys, DigestScheme, RecoverableSig};

use crate::bundle::SignatureSet;
use crate::merkle::merkle_root;
use crate::ForgeError;

/// Digest scheme the forge uses unless told otherwise.
pub const DEFAULT_DIGEST_SCHEME: DigestScheme = DigestScheme::Sha256;

/// Both signatures over one manifest digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualSignature {
    pub digest_scheme: DigestScheme,
    pub digest: [u8; 32],
    pub curve_a: RecoverableSig,
    pub curve_b: [u8; 64],
}

impl DualSignature {
    /// Merkle root over `[manifest, curve A signature, curve B signature]`.
    pub fn merkle_root(&self, manifest_bytes: &[u8]) -> [u8; 32] {
        commitment_root(manifest_bytes, &self.curve_a.compact, &self.curve_b)
    }

    /// Hex-encoded signature fields for the bundle file.
    pub fn to_signature_set(&self) -> SignatureSet {
        SignatureSet {
            manifest_digest_hex: Some(hex::encode(self.digest)),
            curve_a_signature_hex: hex::encode(self.curve_a.compact),
            curve_a_recovery_id: self.curve_a.recovery_id,
            curve_b_signature_hex: hex::encode(self.curve_b),
            digest_algorithm_tag: self.digest_scheme.tag().to_string(),
        }
    }
}

/// The commitment order is fixed: manifest, curve A signature, curve B signature.
pub fn commitment_root(manifest_bytes: &[u8], curve_a_sig: &[u8], curve_b_sig: &[u8]) -> [u8; 32] {
    merkle_root(&[manifest_bytes, curve_a_sig, curve_b_sig])
}

/// Digest manifest bytes under a scheme usable for the forge path.
///
/// The Bitcoin message scheme is reserved for cleartext messages.
pub fn manifest_digest(manifest_bytes: &[u8], scheme: DigestScheme) -> Result<[u8; 32], ForgeError> {
    if scheme == DigestScheme::BitcoinMessage {
        return Err(ForgeError::UnsupportedDigest(scheme.tag().to_string()));
    }
    scheme
        .digest(manifest_bytes)
        .ok_or_else(|| ForgeError::UnsupportedDigest(scheme.tag().to_string()))
}

/// Sign canonical manifest bytes with both curves.
pub fn sign_dual(
    manifest_bytes: &[u8],
    keys: &DerivedKeys,
    scheme: DigestScheme,
) -> Result<DualSignature, ForgeError> {
    let digest = manifest_digest(manifest_bytes, scheme)?;
    let curve_a = sign_recoverable(&digest, keys.secp_secret_key());
    let curve_b = sign_ed25519(&digest, keys.ed25519_signing_key());
    log::debug!(
        "signed manifest digest {} (recovery id {})",
        hex::encode(digest),
        curve_a.recovery_id
    );
    Ok(DualSignature {
        digest_scheme: scheme,
        digest,
        curve_a,
        curve_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::derive_keys;
    use attest_core::signature::{recover_public_key, verify_ed25519};

    #[test]
    fn test_both_signatures_verify() {
        let keys = derive_keys("test-seed-alpha").unwrap();
        let sig = sign_dual(b"{\"id\":\"x\"}", &keys, DEFAULT_DIGEST_SCHEME).unwrap();

        let recovered =
            recover_public_key(&sig.digest, &sig.curve_a.compact, sig.curve_a.recovery_id).unwrap();
        assert_eq!(recovered, keys.secp_public_key());

        let ed_public = keys.ed25519_verifying_key().to_bytes();
        assert!(verify_ed25519(&sig.digest, &ed_public, &sig.curve_b).is_ok());
    }

    #[test]
    fn test_signing_is_reproducible() {
        let keys = derive_keys("test-seed-alpha").unwrap();
        let a = sign_dual(b"manifest", &keys, DigestScheme::Keccak256).unwrap();
        let b = sign_dual(b"manifest", &keys, DigestScheme::Keccak256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bitcoin_message_scheme_rejected() {
        let keys = derive_keys("test-seed-alpha").unwrap();
        assert!(matches!(
            sign_dual(b"manifest", &keys, DigestScheme::BitcoinMessage),
            Err(ForgeError::UnsupportedDigest(_))
        ));
    }

    #[test]
    fn test_signature_set_fields() {
        let keys = derive_keys("test-seed-alpha").unwrap();
        let sig = sign_dual(b"manifest", &keys, DEFAULT_DIGEST_SCHEME).unwrap();
        let set = sig.to_signature_set();
        assert_eq!(set.digest_algorithm_tag, "sha256");
        assert_eq!(set.curve_a_signature_hex.len(), 128);
        assert_eq!(set.curve_b_signature_hex.len(), 128);
        assert_eq!(set.manifest_digest_hex, Some(hex::encode(sig.digest)));
    }
}
