//! Hash primitives and named digest schemes
//!
//! Every digest in the toolkit is 32 bytes. The forge path records which
//! scheme it used; only the forensic scanner has to guess.

use bitcoin::hashes::{hash160, sha256, sha256d, Hash};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Magic prefix used by Bitcoin message signing (length byte included).
pub const BITCOIN_MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Longest message that still fits a single-byte length prefix.
pub const MAX_SIMPLE_PREFIX_LEN: usize = 0xfc;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DigestError {
    #[error("Unknown digest scheme: {0}")]
    UnknownScheme(String),
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).to_byte_array()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

/// Keccak-256 (the pre-standard padding used for account ids).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Bitcoin signed-message digest.
///
/// Returns `None` when the message is too long for a one-byte length prefix.
pub fn bitcoin_message_hash(message: &[u8]) -> Option<[u8; 32]> {
    if message.len() > MAX_SIMPLE_PREFIX_LEN {
        return None;
    }
    let mut buf = Vec::with_capacity(BITCOIN_MESSAGE_MAGIC.len() + 1 + message.len());
    buf.extend_from_slice(BITCOIN_MESSAGE_MAGIC);
    buf.push(message.len() as u8);
    buf.extend_from_slice(message);
    Some(sha256d(&buf))
}

/// A named way of hashing a message before signing or verifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestScheme {
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha256d")]
    DoubleSha256,
    #[serde(rename = "keccak256")]
    Keccak256,
    #[serde(rename = "bitcoin-message")]
    BitcoinMessage,
}

impl DigestScheme {
    /// All schemes, in the order the forensic scanner tries them.
    pub const ALL: [DigestScheme; 4] = [
        DigestScheme::Sha256,
        DigestScheme::DoubleSha256,
        DigestScheme::Keccak256,
        DigestScheme::BitcoinMessage,
    ];

    /// Tag recorded in bundles and reports.
    pub fn tag(&self) -> &'static str {
        match self {
            DigestScheme::Sha256 => "sha256",
            DigestScheme::DoubleSha256 => "sha256d",
            DigestScheme::Keccak256 => "keccak256",
            DigestScheme::BitcoinMessage => "bitcoin-message",
        }
    }

    /// Compute the digest, or `None` if this scheme cannot encode the input.
    pub fn digest(&self, data: &[u8]) -> Option<[u8; 32]> {
        match self {
            DigestScheme::Sha256 => Some(sha256(data)),
            DigestScheme::DoubleSha256 => Some(sha256d(data)),
            DigestScheme::Keccak256 => Some(keccak256(data)),
            DigestScheme::BitcoinMessage => bitcoin_message_hash(data),
        }
    }
}

impl fmt::Display for DigestScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DigestScheme {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DigestScheme::ALL
            .into_iter()
            .find(|scheme| scheme.tag() == s)
            .ok_or_else(|| DigestError::UnknownScheme(s.to_string()))
    }
}
