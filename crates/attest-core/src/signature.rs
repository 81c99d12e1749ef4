//! Signing and verification on both curves
//!
//! secp256k1 signatures are recoverable: 64-byte compact `r||s` plus a
//! recovery id in 0..=3. Nonces follow RFC 6979, so the same key and digest
//! always give the same signature. Ed25519 is deterministic by construction.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Every recovery id a compact signature can carry.
pub const RECOVERY_IDS: [u8; 4] = [0, 1, 2, 3];

/// Offset added to the recovery id in `r||s||v` signatures.
pub const RECOVERY_V_OFFSET: u8 = 27;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Recovery id out of range: {0}")]
    InvalidRecoveryId(u8),
    #[error("Malformed signature: {0}")]
    Malformed(String),
    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Signature does not verify")]
    VerificationFailed,
}

/// A compact secp256k1 signature with its recovery id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSig {
    pub compact: [u8; 64],
    pub recovery_id: u8,
}

impl RecoverableSig {
    /// `r || s || v` with `v = 27 + recovery_id`.
    pub fn to_rsv(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.compact);
        out[64] = RECOVERY_V_OFFSET + self.recovery_id;
        out
    }
}

/// Sign a 32-byte digest with a recoverable secp256k1 signature.
pub fn sign_recoverable(digest: &[u8; 32], secret: &SecretKey) -> RecoverableSig {
    let secp = Secp256k1::signing_only();
    let sig = secp.sign_ecdsa_recoverable(&Message::from_digest(*digest), secret);
    let (recovery_id, compact) = sig.serialize_compact();
    RecoverableSig {
        compact,
        recovery_id: recovery_id.to_i32() as u8,
    }
}

fn parse_recoverable(compact: &[u8], recovery_id: u8) -> Result<RecoverableSignature, SignatureError> {
    if compact.len() != 64 {
        return Err(SignatureError::Malformed(format!(
            "expected 64 bytes, got {}",
            compact.len()
        )));
    }
    let recid = RecoveryId::from_i32(i32::from(recovery_id))
        .map_err(|_| SignatureError::InvalidRecoveryId(recovery_id))?;
    RecoverableSignature::from_compact(compact, recid)
        .map_err(|e| SignatureError::Malformed(e.to_string()))
}

/// Recover the signer's public key for one specific recovery id.
pub fn recover_public_key(
    digest: &[u8; 32],
    compact: &[u8],
    recovery_id: u8,
) -> Result<PublicKey, SignatureError> {
    let sig = parse_recoverable(compact, recovery_id)?;
    Secp256k1::verification_only()
        .recover_ecdsa(&Message::from_digest(*digest), &sig)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))
}

/// Recover a public key and then verify the signature against it independently.
///
/// The check runs on the low-S form, so high-S signatures are accepted.
pub fn recover_and_verify(
    digest: &[u8; 32],
    compact: &[u8],
    recovery_id: u8,
) -> Result<PublicKey, SignatureError> {
    let sig = parse_recoverable(compact, recovery_id)?;
    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(*digest);
    let pubkey = secp
        .recover_ecdsa(&msg, &sig)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    let mut standard = sig.to_standard();
    standard.normalize_s();
    secp.verify_ecdsa(&msg, &standard, &pubkey)
        .map_err(|_| SignatureError::VerificationFailed)?;
    Ok(pubkey)
}

/// Sign a message with Ed25519.
pub fn sign_ed25519(message: &[u8], key: &SigningKey) -> [u8; 64] {
    key.sign(message).to_bytes()
}

/// Verify an Ed25519 signature given raw key and signature bytes.
pub fn verify_ed25519(message: &[u8], public_key: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let key_bytes: [u8; 32] = public_key.try_into().map_err(|_| {
        SignatureError::InvalidPublicKey(format!("expected 32 bytes, got {}", public_key.len()))
    })?;
    let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
        SignatureError::Malformed(format!("expected 64 bytes, got {}", signature.len()))
    })?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}
