//! Deterministic key derivation from a seed phrase
//!
//! One human seed phrase yields two independent secrets:
//! - a secp256k1 scalar (recoverable ECDSA)
//! - an Ed25519 seed
//!
//! Derivation:
//! ```text
//! base    = SHA256(seed)
//! block_i = SHA256(base || context || be32(i))     i = 0, 1
//! secp    = block_0  (re-hashed until it is a valid scalar)
//! ed25519 = block_1
//! ```
//!
//! A [`KeyPath`] other than the root (`core`, index 0) appends
//! `::<namespace>::<index>` to the context, giving independent branches
//! from one seed. The root path keeps the bare context.

use crate::hashing::sha256;
use bitcoin::base58;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain-separation context, versioned with the toolkit.
pub const DERIVATION_CONTEXT: &str = "attest-forge/v1/dual-curve";

/// Tag recorded in manifests describing how the keys were derived.
pub const DERIVATION_SCHEME_TAG: &str = "sha256-expand/secp256k1+ed25519/v1";

/// Upper bound on re-hashing an out-of-range secp256k1 candidate.
pub const MAX_SCALAR_ATTEMPTS: usize = 16;

/// Namespace of the root derivation path.
pub const DEFAULT_NAMESPACE: &str = "core";

const PATH_SEPARATOR: &str = "::";

// Wallet Import Format prefixes and compression flag
const WIF_MAINNET_PREFIX: u8 = 0x80;
const WIF_TESTNET_PREFIX: u8 = 0xef;
const WIF_COMPRESSED_FLAG: u8 = 0x01;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Seed phrase must not be empty")]
    EmptySeed,
    #[error("No valid secp256k1 scalar after {0} attempts")]
    DerivationExhausted(usize),
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),
}

/// Branch of the derivation: a namespace label and an index within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    namespace: String,
    index: u32,
}

impl Default for KeyPath {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            index: 0,
        }
    }
}

impl KeyPath {
    pub fn new(namespace: &str, index: u32) -> Result<Self, KeyError> {
        if namespace.is_empty() {
            return Err(KeyError::InvalidPath("namespace must not be empty".into()));
        }
        if namespace.contains(PATH_SEPARATOR) || namespace.chars().any(char::is_whitespace) {
            return Err(KeyError::InvalidPath(format!(
                "namespace '{}' must not contain whitespace or '{}'",
                namespace, PATH_SEPARATOR
            )));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            index,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_root(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE && self.index == 0
    }

    /// Domain-separation context for this branch.
    pub fn context(&self) -> String {
        if self.is_root() {
            DERIVATION_CONTEXT.to_string()
        } else {
            format!(
                "{}{sep}{}{sep}{}",
                DERIVATION_CONTEXT,
                self.namespace,
                self.index,
                sep = PATH_SEPARATOR
            )
        }
    }

    /// Scheme tag recorded in manifests; non-root paths name their branch.
    pub fn scheme_tag(&self) -> String {
        if self.is_root() {
            DERIVATION_SCHEME_TAG.to_string()
        } else {
            format!("{}#{}/{}", DERIVATION_SCHEME_TAG, self.namespace, self.index)
        }
    }
}

/// Network selector for Wallet Import Format export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifNetwork {
    Mainnet,
    Testnet,
}

impl WifNetwork {
    fn prefix(self) -> u8 {
        match self {
            WifNetwork::Mainnet => WIF_MAINNET_PREFIX,
            WifNetwork::Testnet => WIF_TESTNET_PREFIX,
        }
    }
}

/// Wallet Import Format: Base58Check(prefix || key || [0x01 if compressed]).
pub fn export_wif(secret: &SecretKey, network: WifNetwork, compressed: bool) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(network.prefix());
    payload.extend_from_slice(&secret.secret_bytes());
    if compressed {
        payload.push(WIF_COMPRESSED_FLAG);
    }
    let encoded = base58::encode_check(&payload);
    payload.zeroize();
    encoded
}

/// Key material for both curves, derived from one seed phrase.
///
/// Secrets are erased on drop.
pub struct DerivedKeys {
    secp_secret: SecretKey,
    ed25519_secret: SigningKey,
    seed_fingerprint: [u8; 32],
    path: KeyPath,
}

impl DerivedKeys {
    /// The secp256k1 signing key.
    pub fn secp_secret_key(&self) -> &SecretKey {
        &self.secp_secret
    }

    /// The secp256k1 public key (serialize with `.serialize()` for the compressed form).
    pub fn secp_public_key(&self) -> PublicKey {
        self.secp_secret.public_key(&Secp256k1::signing_only())
    }

    /// The Ed25519 signing key.
    pub fn ed25519_signing_key(&self) -> &SigningKey {
        &self.ed25519_secret
    }

    /// The Ed25519 public key.
    pub fn ed25519_verifying_key(&self) -> VerifyingKey {
        self.ed25519_secret.verifying_key()
    }

    /// `SHA256(seed)`: identifies the seed without revealing it.
    pub fn seed_fingerprint(&self) -> [u8; 32] {
        self.seed_fingerprint
    }

    /// The branch these keys were derived on.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// WIF export of the secp256k1 secret.
    pub fn secp_wif(&self, network: WifNetwork) -> String {
        export_wif(&self.secp_secret, network, true)
    }
}

impl fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("secp_public_key", &hex::encode(self.secp_public_key().serialize()))
            .field(
                "ed25519_public_key",
                &hex::encode(self.ed25519_verifying_key().to_bytes()),
            )
            .field("path", &self.path)
            .field("secrets", &"<redacted>")
            .finish()
    }
}

impl Drop for DerivedKeys {
    fn drop(&mut self) {
        self.secp_secret.non_secure_erase();
        self.seed_fingerprint.zeroize();
    }
}

/// Derive both key pairs from a seed phrase on the root path.
pub fn derive_keys(seed_phrase: &str) -> Result<DerivedKeys, KeyError> {
    derive_keys_at(seed_phrase, &KeyPath::default())
}

/// Derive both key pairs on a specific namespace/index branch.
pub fn derive_keys_at(seed_phrase: &str, path: &KeyPath) -> Result<DerivedKeys, KeyError> {
    if seed_phrase.is_empty() {
        return Err(KeyError::EmptySeed);
    }
    let context = path.context();

    let base = sha256(seed_phrase.as_bytes());
    let mut stream = expand(&base, context.as_bytes());

    let mut secp_candidate = [0u8; 32];
    secp_candidate.copy_from_slice(&stream[..32]);
    let mut ed_seed = [0u8; 32];
    ed_seed.copy_from_slice(&stream[32..]);
    stream.zeroize();

    let secp_secret = reduce_to_scalar(secp_candidate, sha256);
    secp_candidate.zeroize();
    let secp_secret = secp_secret?;

    let ed25519_secret = SigningKey::from_bytes(&ed_seed);
    ed_seed.zeroize();

    Ok(DerivedKeys {
        secp_secret,
        ed25519_secret,
        seed_fingerprint: base,
        path: path.clone(),
    })
}

/// Produce 64 bytes of expansion output from the base digest.
fn expand(base: &[u8; 32], context: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    for (counter, block) in out.chunks_exact_mut(32).enumerate() {
        let mut input = Vec::with_capacity(32 + context.len() + 4);
        input.extend_from_slice(base);
        input.extend_from_slice(context);
        input.extend_from_slice(&(counter as u32).to_be_bytes());
        block.copy_from_slice(&sha256(&input));
        input.zeroize();
    }
    out
}

/// Turn a 32-byte candidate into a secp256k1 scalar, re-hashing on failure.
fn reduce_to_scalar(
    mut candidate: [u8; 32],
    rehash: impl Fn(&[u8]) -> [u8; 32],
) -> Result<SecretKey, KeyError> {
    for attempt in 0..MAX_SCALAR_ATTEMPTS {
        if let Ok(secret) = SecretKey::from_slice(&candidate) {
            candidate.zeroize();
            return Ok(secret);
        }
        log::debug!("secp256k1 candidate {} out of range, re-hashing", attempt);
        candidate = rehash(&candidate[..]);
    }
    candidate.zeroize();
    Err(KeyError::DerivationExhausted(MAX_SCALAR_ATTEMPTS))
}

/// Normalize a private key string: trim, lower-case, strip `0x`.
pub fn normalize_private_key_hex(input: &str) -> String {
    let trimmed = input.trim().to_ascii_lowercase();
    match trimmed.strip_prefix("0x") {
        Some(rest) => rest.to_string(),
        None => trimmed,
    }
}

/// Parse a 64-hex-character secp256k1 private key (optional `0x`).
pub fn parse_secp_private_key(input: &str) -> Result<SecretKey, KeyError> {
    let normalized = normalize_private_key_hex(input);
    if normalized.len() != 64 {
        return Err(KeyError::InvalidPrivateKey(format!(
            "expected 64 hex chars, got {}",
            normalized.len()
        )));
    }
    let bytes = hex::decode(&normalized).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
    SecretKey::from_slice(&bytes).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}
