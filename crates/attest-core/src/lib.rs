//! Attest Core
//!
//! Primitives shared by the forge, the bulk signer and the forensic scanner.
//!
//! # Hashing
//!
//! SHA-256, SHA-256d, HASH160 and Keccak-256, plus the named
//! [`DigestScheme`]s used to pick one of them by tag.
//!
//! # Key Derivation
//!
//! A seed phrase is stretched into a secp256k1 scalar and an Ed25519 seed:
//!
//! ```
//! use attest_core::derive_keys;
//!
//! let keys = derive_keys("test-seed-alpha").unwrap();
//! let again = derive_keys("test-seed-alpha").unwrap();
//! assert_eq!(keys.secp_public_key(), again.secp_public_key());
//! ```
//!
//! # Addresses
//!
//! Account id (Keccak), legacy Base58Check and segwit v0 Bech32 encodings of
//! the secp256k1 key.
//!
//! # Signatures
//!
//! Recoverable secp256k1 ECDSA (RFC 6979 nonces) and Ed25519.

pub mod address;
pub mod hashing;
pub mod keys;
pub mod memory;
pub mod signature;

pub use address::{parse_hrp, AddressError, AddressSet, DEFAULT_WITNESS_HRP};
pub use hashing::{DigestError, DigestScheme};
pub use keys::{
    derive_keys, derive_keys_at, export_wif, normalize_private_key_hex, parse_secp_private_key,
    DerivedKeys, KeyError, KeyPath, WifNetwork, DEFAULT_NAMESPACE, DERIVATION_CONTEXT,
    DERIVATION_SCHEME_TAG,
};
pub use signature::{RecoverableSig, SignatureError, RECOVERY_IDS};

// Downstream crates sign and verify with the same curve types.
pub use bitcoin::bech32::Hrp;
pub use secp256k1;
pub use ed25519_dalek;
