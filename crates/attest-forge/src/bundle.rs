//! Bundle file format
//!
//! ```json
//! {
//!   "manifest": { ... },
//!   "signatures": {
//!     "manifest_digest_hex": "...",   (optional)
//!     "curveA_signature_hex": "...",
//!     "curveA_recovery_id": 1,
//!     "curveB_signature_hex": "...",
//!     "digest_algorithm_tag": "sha256"
//!   },
//!   "merkle_root_hex": "..."
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::manifest::ClaimManifest;
use crate::ForgeError;

/// Signature fields of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    /// Informational copy of the signed digest. Bundles written without it
    /// still verify; when present it must match the recomputed digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_digest_hex: Option<String>,
    #[serde(rename = "curveA_signature_hex")]
    pub curve_a_signature_hex: String,
    #[serde(rename = "curveA_recovery_id")]
    pub curve_a_recovery_id: u8,
    #[serde(rename = "curveB_signature_hex")]
    pub curve_b_signature_hex: String,
    pub digest_algorithm_tag: String,
}

/// A manifest together with its signatures and Merkle commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBundle {
    pub manifest: ClaimManifest,
    pub signatures: SignatureSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merkle_root_hex: Option<String>,
}

impl SignatureBundle {
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ForgeError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ForgeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
