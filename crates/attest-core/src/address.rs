//! Address encodings for a secp256k1 public key
//!
//! Three identifiers are derived from the same 33-byte compressed key:
//! - account id: `0x` + last 20 bytes of Keccak-256(uncompressed[1..])
//! - legacy: Base58Check(0x00 || HASH160(compressed))
//! - witness: segwit v0 Bech32 of HASH160(compressed)
//!
//! The legacy and witness forms wrap the same 20-byte hash. Signatures made
//! with an uncompressed key commit to HASH160 of the 65-byte point instead,
//! which only has a legacy encoding.

use crate::hashing::{hash160, keccak256};
use bitcoin::base58;
use bitcoin::bech32::{segwit, Fe32, Hrp};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version byte for mainnet pay-to-pubkey-hash addresses.
pub const LEGACY_VERSION_BYTE: u8 = 0x00;

/// Default human-readable prefix for witness addresses.
pub const DEFAULT_WITNESS_HRP: &str = "bc";

/// Prefix on account ids.
pub const ACCOUNT_ID_PREFIX: &str = "0x";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid human-readable prefix '{0}': {1}")]
    InvalidHrp(String, String),
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Decoding failed: {0}")]
    Decoding(String),
}

/// Parse a witness human-readable prefix such as `bc` or `tb`.
pub fn parse_hrp(hrp: &str) -> Result<Hrp, AddressError> {
    Hrp::parse(hrp).map_err(|e| AddressError::InvalidHrp(hrp.to_string(), e.to_string()))
}

/// Keccak-based account id. The only form that needs the uncompressed point.
pub fn account_id(pubkey: &PublicKey) -> String {
    let uncompressed = pubkey.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);
    format!("{}{}", ACCOUNT_ID_PREFIX, hex::encode(&digest[12..]))
}

/// Base58Check pay-to-pubkey-hash address of the compressed key.
pub fn legacy_address(pubkey: &PublicKey) -> String {
    encode_legacy(&hash160(&pubkey.serialize()))
}

/// Base58Check pay-to-pubkey-hash address of the 65-byte uncompressed key.
pub fn legacy_address_uncompressed(pubkey: &PublicKey) -> String {
    encode_legacy(&hash160(&pubkey.serialize_uncompressed()))
}

/// Segwit v0 address of the compressed key under `hrp`.
pub fn witness_address(pubkey: &PublicKey, hrp: Hrp) -> Result<String, AddressError> {
    encode_witness(&hash160(&pubkey.serialize()), hrp)
}

/// Base58Check(`0x00` || hash) for any 20-byte hash.
pub fn encode_legacy(key_hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(LEGACY_VERSION_BYTE);
    payload.extend_from_slice(key_hash);
    base58::encode_check(&payload)
}

fn encode_witness(key_hash: &[u8; 20], hrp: Hrp) -> Result<String, AddressError> {
    segwit::encode_v0(hrp, key_hash).map_err(|e| AddressError::Encoding(e.to_string()))
}

/// Recover the 20-byte key hash behind a legacy address.
pub fn decode_legacy_hash(address: &str) -> Result<[u8; 20], AddressError> {
    let payload =
        base58::decode_check(address).map_err(|e| AddressError::Decoding(e.to_string()))?;
    if payload.len() != 21 || payload[0] != LEGACY_VERSION_BYTE {
        return Err(AddressError::Decoding(format!(
            "unexpected legacy payload ({} bytes)",
            payload.len()
        )));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&payload[1..]);
    Ok(out)
}

/// Recover the human-readable prefix and 20-byte key hash behind a witness address.
pub fn decode_witness_hash(address: &str) -> Result<(Hrp, [u8; 20]), AddressError> {
    let (hrp, version, program) =
        segwit::decode(address).map_err(|e| AddressError::Decoding(e.to_string()))?;
    if version != Fe32::Q || program.len() != 20 {
        return Err(AddressError::Decoding(format!(
            "not a v0 key-hash program (version {}, {} bytes)",
            version.to_char(),
            program.len()
        )));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&program);
    Ok((hrp, out))
}

/// The three identifiers derived from one public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSet {
    pub account_id: String,
    pub legacy_address: String,
    pub witness_address: String,
}

impl AddressSet {
    /// Derive all three forms from a public key.
    pub fn derive(pubkey: &PublicKey, hrp: Hrp) -> Result<Self, AddressError> {
        let key_hash = hash160(&pubkey.serialize());
        Ok(Self {
            account_id: account_id(pubkey),
            legacy_address: encode_legacy(&key_hash),
            witness_address: encode_witness(&key_hash, hrp)?,
        })
    }

    /// Derive from a serialized key (33-byte compressed or 65-byte uncompressed).
    pub fn from_slice(pubkey: &[u8], hrp: Hrp) -> Result<Self, AddressError> {
        let pubkey = PublicKey::from_slice(pubkey)
            .map_err(|e| AddressError::InvalidPublicKey(e.to_string()))?;
        Self::derive(&pubkey, hrp)
    }

    /// Derive from a hex-encoded key.
    pub fn from_hex(pubkey_hex: &str, hrp: Hrp) -> Result<Self, AddressError> {
        let bytes =
            hex::decode(pubkey_hex).map_err(|e| AddressError::InvalidPublicKey(e.to_string()))?;
        Self::from_slice(&bytes, hrp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    fn key_one() -> PublicKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SecretKey::from_slice(&bytes)
            .unwrap()
            .public_key(&Secp256k1::signing_only())
    }

    fn bc() -> Hrp {
        parse_hrp(DEFAULT_WITNESS_HRP).unwrap()
    }

    /// Private key 1 is the generator point; its addresses are well known.
    #[test]
    fn test_generator_point_vectors() {
        let set = AddressSet::derive(&key_one(), bc()).unwrap();
        assert_eq!(set.account_id, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(set.legacy_address, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(
            set.witness_address,
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn test_uncompressed_legacy_vector() {
        assert_eq!(
            legacy_address_uncompressed(&key_one()),
            "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
        );
        assert_ne!(
            legacy_address_uncompressed(&key_one()),
            legacy_address(&key_one())
        );
    }

    #[test]
    fn test_legacy_and_witness_share_key_hash() {
        let pubkey = key_one();
        let set = AddressSet::derive(&pubkey, bc()).unwrap();

        let legacy_hash = decode_legacy_hash(&set.legacy_address).unwrap();
        let (hrp, witness_hash) = decode_witness_hash(&set.witness_address).unwrap();

        assert_eq!(legacy_hash, witness_hash);
        assert_eq!(legacy_hash, hash160(&pubkey.serialize()));
        assert_eq!(hrp, bc());
    }

    #[test]
    fn test_custom_hrp() {
        let tb = parse_hrp("tb").unwrap();
        let addr = witness_address(&key_one(), tb).unwrap();
        assert!(addr.starts_with("tb1q"));
    }

    #[test]
    fn test_invalid_hrp_rejected() {
        assert!(matches!(parse_hrp(""), Err(AddressError::InvalidHrp(..))));
        assert!(matches!(parse_hrp("b c"), Err(AddressError::InvalidHrp(..))));
    }

    #[test]
    fn test_from_hex_accepts_both_encodings() {
        let pubkey = key_one();
        let compressed = AddressSet::from_hex(&hex::encode(pubkey.serialize()), bc()).unwrap();
        let uncompressed =
            AddressSet::from_hex(&hex::encode(pubkey.serialize_uncompressed()), bc()).unwrap();
        // Both normalize to the compressed form for the hash-based encodings
        assert_eq!(compressed, uncompressed);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(AddressSet::from_hex("zz", bc()).is_err());
        assert!(AddressSet::from_hex(&"02".repeat(10), bc()).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_payloads() {
        assert!(decode_legacy_hash("not-base58!").is_err());
        assert!(decode_witness_hash("bc1notanaddress").is_err());
    }
}
