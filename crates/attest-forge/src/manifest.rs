//! Canonical claim manifest
//!
//! The manifest is the document both signatures cover. Its canonical form
//! is compact JSON with keys in the declaration order of [`ClaimManifest`],
//! so any implementation that writes the same fields in the same order
//! produces the same bytes.

use attest_core::hashing::sha256;
use attest_core::{AddressSet, DerivedKeys, Hrp, KeyPath};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ForgeError;

/// Glyph tag stamped on manifests when the caller supplies none.
pub const DEFAULT_GLYPH_TAG: &str = "∇⊸≋∇";

/// The signed claim document. Field order is the canonical key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimManifest {
    pub id: String,
    pub anchor_phrase: String,
    pub glyph_tag: String,
    pub timestamp: String,
    #[serde(rename = "curveA_pubkey_hex")]
    pub curve_a_pubkey_hex: String,
    #[serde(rename = "curveB_pubkey_hex")]
    pub curve_b_pubkey_hex: String,
    pub account_id: String,
    pub legacy_address: String,
    pub witness_address: String,
    pub derivation_scheme_tag: String,
    pub note: String,
}

impl ClaimManifest {
    /// Canonical bytes: compact JSON in fixed key order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ForgeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a manifest from JSON (any whitespace; unknown keys rejected).
    pub fn from_json(bytes: &[u8]) -> Result<Self, ForgeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Caller-supplied manifest metadata. `None` fields take defaults.
#[derive(Debug, Clone)]
pub struct ManifestParams {
    pub id: Option<String>,
    pub anchor_phrase: Option<String>,
    pub glyph_tag: Option<String>,
    pub timestamp: Option<String>,
    pub note: Option<String>,
    pub hrp: Hrp,
    /// Derivation branch; the root path unless set
    pub path: KeyPath,
}

impl ManifestParams {
    pub fn new(hrp: Hrp) -> Self {
        Self {
            id: None,
            anchor_phrase: None,
            glyph_tag: None,
            timestamp: None,
            note: None,
            hrp,
            path: KeyPath::default(),
        }
    }
}

/// Assemble the manifest for a derived key set.
pub fn build_manifest(keys: &DerivedKeys, params: &ManifestParams) -> Result<ClaimManifest, ForgeError> {
    let secp_public = keys.secp_public_key().serialize();
    let addresses = AddressSet::from_slice(&secp_public, params.hrp)?;

    let id = params
        .id
        .clone()
        .unwrap_or_else(|| hex::encode(&sha256(&secp_public)[..8]));
    let anchor_phrase = params
        .anchor_phrase
        .clone()
        .unwrap_or_else(|| format!("seed-sha256:{}", hex::encode(keys.seed_fingerprint())));
    let timestamp = params
        .timestamp
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    Ok(ClaimManifest {
        id,
        anchor_phrase,
        glyph_tag: params
            .glyph_tag
            .clone()
            .unwrap_or_else(|| DEFAULT_GLYPH_TAG.to_string()),
        timestamp,
        curve_a_pubkey_hex: hex::encode(secp_public),
        curve_b_pubkey_hex: hex::encode(keys.ed25519_verifying_key().to_bytes()),
        account_id: addresses.account_id,
        legacy_address: addresses.legacy_address,
        witness_address: addresses.witness_address,
        derivation_scheme_tag: keys.path().scheme_tag(),
        note: params.note.clone().unwrap_or_default(),
    })
}
