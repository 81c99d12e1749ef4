//! Attest Forge
//!
//! Deterministic cross-curve attestation: a seed phrase becomes a signed,
//! Merkle-committed claim manifest that anyone can verify from the public
//! data alone.
//!
//! # Flow
//!
//! ```text
//! seed ─► keys ─► manifest ─► canonical bytes ─► digest ─┬─► secp256k1 (recoverable)
//!                                                        └─► Ed25519
//!          Merkle root over [manifest, sig A, sig B] ─► bundle
//! ```
//!
//! # Example
//!
//! ```
//! use attest_core::{parse_hrp, DigestScheme};
//! use attest_forge::{forge, verify_bundle, ManifestParams};
//!
//! let mut params = ManifestParams::new(parse_hrp("bc").unwrap());
//! params.timestamp = Some("2024-01-01T00:00:00Z".into());
//!
//! let out = forge("test-seed-alpha", &params, DigestScheme::Sha256).unwrap();
//! let report = verify_bundle(&out.manifest, &out.bundle).unwrap();
//! assert!(report.accepted());
//! ```

pub mod bundle;
pub mod manifest;
pub mod merkle;
pub mod signing;
pub mod sink;
pub mod verify;

pub use bundle::{SignatureBundle, SignatureSet};
pub use manifest::{build_manifest, ClaimManifest, ManifestParams};
pub use signing::{sign_dual, DualSignature, DEFAULT_DIGEST_SCHEME};
pub use sink::{ArtifactSink, DirectorySink, MemorySink, BUNDLE_FILE, MANIFEST_FILE};
pub use verify::{verify_bundle, CheckKind, CheckResult, CheckStatus, VerificationReport};

use attest_core::{derive_keys_at, AddressError, DigestScheme, KeyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Key derivation failed: {0}")]
    Key(#[from] KeyError),
    #[error("Address derivation failed: {0}")]
    Address(#[from] AddressError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Digest scheme not usable for manifests: {0}")]
    UnsupportedDigest(String),
}

/// Everything the forge produces for one seed.
#[derive(Debug, Clone)]
pub struct ForgeOutput {
    pub manifest: ClaimManifest,
    pub manifest_bytes: Vec<u8>,
    pub bundle: SignatureBundle,
}

impl ForgeOutput {
    /// Write `manifest.json` (canonical bytes) and `bundle.json` (pretty JSON).
    pub fn write_to(&self, sink: &mut dyn ArtifactSink) -> Result<(), ForgeError> {
        sink.write_artifact(MANIFEST_FILE, &self.manifest_bytes)?;
        sink.write_artifact(BUNDLE_FILE, &self.bundle.to_json_pretty()?)?;
        Ok(())
    }
}

/// Derive keys on `params.path`, build and sign the manifest, and commit to the result.
pub fn forge(
    seed_phrase: &str,
    params: &ManifestParams,
    scheme: DigestScheme,
) -> Result<ForgeOutput, ForgeError> {
    let keys = derive_keys_at(seed_phrase, &params.path)?;
    let manifest = build_manifest(&keys, params)?;
    let manifest_bytes = manifest.canonical_bytes()?;

    let signature = sign_dual(&manifest_bytes, &keys, scheme)?;
    let root = signature.merkle_root(&manifest_bytes);
    log::info!(
        "forged manifest {} for {} (root {})",
        manifest.id,
        manifest.account_id,
        hex::encode(root)
    );

    let bundle = SignatureBundle {
        manifest: manifest.clone(),
        signatures: signature.to_signature_set(),
        merkle_root_hex: Some(hex::encode(root)),
    };
    Ok(ForgeOutput {
        manifest,
        manifest_bytes,
        bundle,
    })
}
