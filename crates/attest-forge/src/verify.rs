//! Bundle verification without private keys
//!
//! Three independent checks, each reported on its own:
//! 1. curve A: recover the secp256k1 key for the declared recovery id and
//!    compare it byte-for-byte with the manifest's key
//! 2. curve B: verify the Ed25519 signature against the manifest's key
//! 3. Merkle: recompute the commitment over manifest and both signatures
//!
//! The verifier never tries other recovery ids; a wrong id is a failure.

use attest_core::signature::{recover_public_key, verify_ed25519};
use attest_core::DigestScheme;
use serde::Serialize;
use std::fmt;

use crate::bundle::{SignatureBundle, SignatureSet};
use crate::manifest::ClaimManifest;
use crate::signing::{commitment_root, manifest_digest};
use crate::ForgeError;

/// Which proof a check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckKind {
    CurveARecovery,
    CurveBSignature,
    MerkleRoot,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::CurveARecovery => "curveA-recovery",
            CheckKind::CurveBSignature => "curveB-signature",
            CheckKind::MerkleRoot => "merkle-root",
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Pass,
    Fail(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub status: CheckStatus,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CheckStatus::Pass => write!(f, "{:<18} pass", self.kind.label()),
            CheckStatus::Fail(reason) => write!(f, "{:<18} fail: {}", self.kind.label(), reason),
            CheckStatus::Skipped(reason) => {
                write!(f, "{:<18} skipped: {}", self.kind.label(), reason)
            }
        }
    }
}

/// Per-check results for one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    /// True when no check failed. A skipped Merkle check does not reject.
    pub fn accepted(&self) -> bool {
        self.checks
            .iter()
            .all(|c| !matches!(c.status, CheckStatus::Fail(_)))
    }

    pub fn check(&self, kind: CheckKind) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::Fail(_)))
    }
}

/// Verify a bundle against the manifest it claims to attest.
///
/// The manifest argument is authoritative; the copy embedded in the bundle
/// is only compared for a warning.
pub fn verify_bundle(
    manifest: &ClaimManifest,
    bundle: &SignatureBundle,
) -> Result<VerificationReport, ForgeError> {
    if bundle.manifest != *manifest {
        log::warn!("manifest embedded in bundle differs from the manifest under verification");
    }
    let bytes = manifest.canonical_bytes()?;
    Ok(verify_manifest_bytes(
        &bytes,
        &manifest.curve_a_pubkey_hex,
        &manifest.curve_b_pubkey_hex,
        &bundle.signatures,
        bundle.merkle_root_hex.as_deref(),
    ))
}

/// Verify raw manifest bytes against declared public keys.
pub fn verify_manifest_bytes(
    manifest_bytes: &[u8],
    curve_a_pubkey_hex: &str,
    curve_b_pubkey_hex: &str,
    signatures: &SignatureSet,
    merkle_root_hex: Option<&str>,
) -> VerificationReport {
    let digest = recompute_digest(manifest_bytes, &signatures.digest_algorithm_tag);

    let checks = vec![
        CheckResult {
            kind: CheckKind::CurveARecovery,
            status: to_status(check_curve_a(&digest, signatures, curve_a_pubkey_hex)),
        },
        CheckResult {
            kind: CheckKind::CurveBSignature,
            status: to_status(check_curve_b(&digest, signatures, curve_b_pubkey_hex)),
        },
        CheckResult {
            kind: CheckKind::MerkleRoot,
            status: match merkle_root_hex {
                Some(root) => to_status(check_merkle(manifest_bytes, signatures, root)),
                None => CheckStatus::Skipped("bundle carries no merkle root".into()),
            },
        },
    ];

    for check in &checks {
        log::debug!("{}", check);
    }
    VerificationReport { checks }
}

fn to_status(result: Result<(), String>) -> CheckStatus {
    match result {
        Ok(()) => CheckStatus::Pass,
        Err(reason) => CheckStatus::Fail(reason),
    }
}

fn recompute_digest(manifest_bytes: &[u8], tag: &str) -> Result<[u8; 32], String> {
    let scheme: DigestScheme = tag.parse().map_err(|e| format!("{}", e))?;
    manifest_digest(manifest_bytes, scheme).map_err(|e| e.to_string())
}

fn decode_hex(label: &str, value: &str) -> Result<Vec<u8>, String> {
    hex::decode(value).map_err(|e| format!("{} is not valid hex: {}", label, e))
}

fn check_curve_a(
    digest: &Result<[u8; 32], String>,
    signatures: &SignatureSet,
    declared_hex: &str,
) -> Result<(), String> {
    let digest = digest.as_ref().map_err(Clone::clone)?;
    let signature = decode_hex("curveA signature", &signatures.curve_a_signature_hex)?;
    let declared = decode_hex("curveA public key", declared_hex)?;

    let recovered = recover_public_key(digest, &signature, signatures.curve_a_recovery_id)
        .map_err(|e| e.to_string())?
        .serialize();
    if recovered[..] != declared[..] {
        return Err(format!(
            "recovered key {} does not match declared key {}",
            hex::encode(recovered),
            declared_hex
        ));
    }

    if let Some(declared_digest) = &signatures.manifest_digest_hex {
        let recomputed = hex::encode(digest);
        if !declared_digest.eq_ignore_ascii_case(&recomputed) {
            return Err(format!(
                "declared digest {} differs from recomputed {}",
                declared_digest, recomputed
            ));
        }
    }
    Ok(())
}

fn check_curve_b(
    digest: &Result<[u8; 32], String>,
    signatures: &SignatureSet,
    declared_hex: &str,
) -> Result<(), String> {
    let digest = digest.as_ref().map_err(Clone::clone)?;
    let signature = decode_hex("curveB signature", &signatures.curve_b_signature_hex)?;
    let declared = decode_hex("curveB public key", declared_hex)?;
    verify_ed25519(digest, &declared, &signature).map_err(|e| e.to_string())
}

fn check_merkle(
    manifest_bytes: &[u8],
    signatures: &SignatureSet,
    declared_root_hex: &str,
) -> Result<(), String> {
    let curve_a = decode_hex("curveA signature", &signatures.curve_a_signature_hex)?;
    let curve_b = decode_hex("curveB signature", &signatures.curve_b_signature_hex)?;
    let root = hex::encode(commitment_root(manifest_bytes, &curve_a, &curve_b));
    if !root.eq_ignore_ascii_case(declared_root_hex) {
        return Err(format!(
            "recomputed root {} does not match declared {}",
            root, declared_root_hex
        ));
    }
    Ok(())
}
