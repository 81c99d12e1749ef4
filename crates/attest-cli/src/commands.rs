//! Subcommand implementations
//!
//! Every command writes its report to the given writer and returns an
//! [`Outcome`]; diagnostics about skipped input go to stderr.

use anyhow::{Context, Result};
use attest_bulk::KeyRing;
use attest_core::{
    derive_keys_at, parse_hrp, AddressSet, DigestScheme, Hrp, KeyPath, WifNetwork,
    DEFAULT_NAMESPACE,
};
use attest_forensics::build_scanner;
use attest_forge::{
    forge as forge_manifest, verify_bundle, ClaimManifest, DirectorySink, ManifestParams,
    SignatureBundle,
};
use serde::Serialize;
use std::io::{IsTerminal, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use crate::config::AttestConfig;
use crate::{
    AddressArgs, BulkSignArgs, Command, ForgeArgs, PathArgs, ScanArgs, SeedSource, VerifyArgs,
};

/// How a command finished, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

pub fn dispatch(config: &AttestConfig, command: Command, out: &mut dyn Write) -> Result<Outcome> {
    match command {
        Command::Forge(args) => forge(config, args, out),
        Command::Verify(args) => verify(args, out),
        Command::BulkSign(args) => bulk_sign(config, args, out),
        Command::Scan(args) => scan(config, args, out),
        Command::Address(args) => address(config, args, out),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// File contents without trailing line breaks, as editors leave them.
fn read_trimmed(path: &Path) -> Result<String> {
    Ok(read_file(path)?
        .trim_end_matches(&['\n', '\r'][..])
        .to_string())
}

fn read_seed(source: &SeedSource) -> Result<String> {
    let seed = match (&source.seed, &source.seed_file) {
        (Some(seed), _) => seed.clone(),
        (None, Some(path)) => read_trimmed(path)?,
        (None, None) => anyhow::bail!("--seed or --seed-file is required"),
    };
    anyhow::ensure!(!seed.is_empty(), "seed phrase must not be empty");
    Ok(seed)
}

fn resolve_path(args: &PathArgs) -> Result<KeyPath> {
    let namespace = args.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
    KeyPath::new(namespace, args.index).with_context(|| "Invalid --namespace/--index")
}

fn resolve_hrp(flag: Option<&str>, config: &AttestConfig) -> Result<Hrp> {
    match flag {
        Some(hrp) => parse_hrp(hrp).with_context(|| format!("Invalid --hrp '{}'", hrp)),
        None => config.hrp(),
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn forge(config: &AttestConfig, args: ForgeArgs, out: &mut dyn Write) -> Result<Outcome> {
    let seed = read_seed(&args.seed)?;
    let scheme = match &args.digest {
        Some(tag) => {
            let scheme: DigestScheme = tag.parse()?;
            anyhow::ensure!(
                scheme != DigestScheme::BitcoinMessage,
                "bitcoin-message digests apply to cleartext messages, not manifests"
            );
            scheme
        }
        None => config.digest_scheme()?,
    };

    let mut params = ManifestParams::new(resolve_hrp(args.hrp.as_deref(), config)?);
    params.id = args.id;
    params.anchor_phrase = args.anchor;
    params.glyph_tag = Some(args.glyph.unwrap_or_else(|| config.forge.glyph_tag.clone()));
    params.timestamp = args.timestamp;
    params.note = args.note;
    params.path = resolve_path(&args.path)?;

    let output = forge_manifest(&seed, &params, scheme).context("Forge failed")?;

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| config.forge.output_dir.clone());
    let mut sink = DirectorySink::new(&out_dir);
    output
        .write_to(&mut sink)
        .with_context(|| format!("Failed to write artifacts to {}", out_dir.display()))?;

    writeln!(out, "Manifest:    {}", output.manifest.id)?;
    writeln!(out, "Account id:  {}", output.manifest.account_id)?;
    writeln!(out, "Legacy:      {}", output.manifest.legacy_address)?;
    writeln!(out, "Witness:     {}", output.manifest.witness_address)?;
    if let Some(root) = &output.bundle.merkle_root_hex {
        writeln!(out, "Merkle root: {}", root)?;
    }
    writeln!(out, "Written to   {}", out_dir.display())?;
    Ok(Outcome::Success)
}

pub fn verify(args: VerifyArgs, out: &mut dyn Write) -> Result<Outcome> {
    let manifest_bytes = std::fs::read(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest.display()))?;
    let bundle_bytes = std::fs::read(&args.bundle)
        .with_context(|| format!("Failed to read {}", args.bundle.display()))?;

    let manifest = ClaimManifest::from_json(&manifest_bytes).context("Invalid manifest")?;
    let bundle = SignatureBundle::from_json(&bundle_bytes).context("Invalid bundle")?;
    let report = verify_bundle(&manifest, &bundle)?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        for check in &report.checks {
            writeln!(out, "{}", check)?;
        }
    }

    if report.accepted() {
        writeln!(out, "accepted")?;
        Ok(Outcome::Success)
    } else {
        writeln!(out, "rejected")?;
        Ok(Outcome::Failure)
    }
}

pub fn bulk_sign(config: &AttestConfig, args: BulkSignArgs, out: &mut dyn Write) -> Result<Outcome> {
    let message = match (&args.message.message, &args.message.message_file) {
        (Some(message), _) => message.clone(),
        (None, Some(path)) => read_trimmed(path)?,
        (None, None) => anyhow::bail!("--message or --message-file is required"),
    };

    let keyfile = args.keys.clone().or_else(|| {
        if args.key.is_empty() {
            config.signer.keyfile.clone()
        } else {
            None
        }
    });
    anyhow::ensure!(
        keyfile.is_some() || !args.key.is_empty(),
        "no keys given: use --keys <path> or --key <hex>"
    );

    let mut ring = KeyRing::new();
    if let Some(path) = &keyfile {
        let report = ring.load_file(path)?;
        if !report.skipped.is_empty() {
            eprintln!(
                "Skipped {} unusable lines in {}",
                report.skipped.len(),
                path.display()
            );
        }
    }
    for key in &args.key {
        if let Err(e) = ring.add_key(key) {
            log::warn!("--key ignored: {}", e);
        }
    }
    anyhow::ensure!(!ring.is_empty(), "no valid keys to sign with");

    let report = ring.sign(&message)?;
    for skipped in &report.skipped {
        eprintln!("Skipped {}: {}", skipped.account_id, skipped.reason);
    }

    match &args.out {
        Some(path) => {
            write_json(&report.records, path)?;
            eprintln!("Wrote {} signatures to {}", report.records.len(), path.display());
        }
        None => writeln!(out, "{}", serde_json::to_string_pretty(&report.records)?)?,
    }
    Ok(Outcome::Success)
}

fn read_blob(input: Option<&str>) -> Result<String> {
    match input {
        Some(input) if Path::new(input).is_file() => read_file(Path::new(input)),
        Some(input) => Ok(input.to_string()),
        None => {
            let mut stdin = std::io::stdin();
            anyhow::ensure!(
                !stdin.is_terminal(),
                "provide a blob, a file path, or pipe data via stdin"
            );
            let mut blob = String::new();
            stdin
                .read_to_string(&mut blob)
                .context("Failed to read stdin")?;
            Ok(blob)
        }
    }
}

pub fn scan(config: &AttestConfig, args: ScanArgs, out: &mut dyn Write) -> Result<Outcome> {
    let blob = read_blob(args.input.as_deref())?;

    let mut messages = config.scanner.messages.clone();
    messages.extend(args.msgs.iter().cloned());
    let hrp = args.hrp.clone().unwrap_or_else(|| config.scanner.hrp.clone());

    let scanner = build_scanner(&messages, args.messages_file.as_deref(), &hrp)?
        .with_targets(args.target.iter().cloned());
    let report = scanner.scan(&blob);

    writeln!(
        out,
        "Chunks: {} found, {} decoded; {} proofs",
        report.chunks_found,
        report.chunks_decoded,
        report.proofs.len()
    )?;
    if let Some(fingerprint) = &report.attestation_address {
        writeln!(out, "Chain fingerprint: {}", fingerprint)?;
    }
    if args.target.is_empty() && !report.proofs.is_empty() {
        writeln!(out, "No --target given: proofs below do not identify a signer")?;
    }
    for proof in &report.proofs {
        writeln!(
            out,
            "#{} {} recid={} msg={:?} -> {} / {} / {}",
            proof.source_chunk_index,
            proof.digest_scheme,
            proof.recovery_id_used,
            proof.message_candidate,
            proof.account_id_variants.eth,
            proof.account_id_variants.btc_legacy,
            proof.account_id_variants.btc_witness,
        )?;
    }

    if let Some(path) = &args.json {
        write_json(&report.proofs, path)?;
    }
    // A completed scan always succeeds, matches or not
    Ok(Outcome::Success)
}

#[derive(Serialize)]
struct AddressReport {
    #[serde(rename = "curveA_pubkey_hex")]
    curve_a_pubkey_hex: String,
    #[serde(rename = "curveB_pubkey_hex")]
    curve_b_pubkey_hex: String,
    #[serde(flatten)]
    addresses: AddressSet,
    derivation_scheme_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    wif: Option<String>,
}

pub fn address(config: &AttestConfig, args: AddressArgs, out: &mut dyn Write) -> Result<Outcome> {
    let seed = read_seed(&args.seed)?;
    let hrp = match (args.hrp.as_deref(), args.testnet) {
        (None, true) => parse_hrp("tb")?,
        (flag, _) => resolve_hrp(flag, config)?,
    };
    let path = resolve_path(&args.path)?;
    let keys = derive_keys_at(&seed, &path)?;
    let secp_public = keys.secp_public_key();

    let network = if args.testnet {
        WifNetwork::Testnet
    } else {
        WifNetwork::Mainnet
    };
    let report = AddressReport {
        curve_a_pubkey_hex: hex::encode(secp_public.serialize()),
        curve_b_pubkey_hex: hex::encode(keys.ed25519_verifying_key().to_bytes()),
        addresses: AddressSet::derive(&secp_public, hrp)?,
        derivation_scheme_tag: path.scheme_tag(),
        wif: args.wif.then(|| keys.secp_wif(network)),
    };

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(out, "curveA pubkey: {}", report.curve_a_pubkey_hex)?;
        writeln!(out, "curveB pubkey: {}", report.curve_b_pubkey_hex)?;
        writeln!(out, "Account id:    {}", report.addresses.account_id)?;
        writeln!(out, "Legacy:        {}", report.addresses.legacy_address)?;
        writeln!(out, "Witness:       {}", report.addresses.witness_address)?;
        writeln!(out, "Derivation:    {}", report.derivation_scheme_tag)?;
        if let Some(wif) = &report.wif {
            writeln!(out, "WIF:           {}", wif)?;
        }
    }
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::error::ErrorKind;
    use clap::Parser;
    use tempfile::TempDir;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    fn run(args: &[&str]) -> (Result<Outcome>, String) {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        let mut out = Vec::new();
        let outcome = dispatch(&AttestConfig::default(), cli.command, &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    fn forged(tmp: &TempDir) -> (String, String) {
        let dir = tmp.path().join("out");
        let dir_str = dir.to_str().unwrap();
        let (outcome, _) = run(&[
            "attest",
            "forge",
            "--seed",
            "test-seed-alpha",
            "--timestamp",
            "2024-01-01T00:00:00Z",
            "--out-dir",
            dir_str,
        ]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        (
            dir.join("manifest.json").to_str().unwrap().to_string(),
            dir.join("bundle.json").to_str().unwrap().to_string(),
        )
    }

    #[test]
    fn test_verify_accepts_forged_artifacts() {
        let tmp = TempDir::new().unwrap();
        let (manifest, bundle) = forged(&tmp);
        let (outcome, text) = run(&["attest", "verify", manifest.as_str(), bundle.as_str()]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        assert_eq!(text.lines().last(), Some("accepted"));
    }

    #[test]
    fn test_verify_failure_prints_every_check() {
        let tmp = TempDir::new().unwrap();
        let (manifest, bundle) = forged(&tmp);

        let mut value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&bundle).unwrap()).unwrap();
        value["merkle_root_hex"] = serde_json::json!("00".repeat(32));
        std::fs::write(&bundle, serde_json::to_vec(&value).unwrap()).unwrap();

        let (outcome, text) = run(&["attest", "verify", manifest.as_str(), bundle.as_str()]);
        assert_eq!(outcome.unwrap(), Outcome::Failure);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("curveA-recovery") && lines[0].ends_with("pass"));
        assert!(lines[1].starts_with("curveB-signature") && lines[1].ends_with("pass"));
        assert!(lines[2].starts_with("merkle-root") && lines[2].contains("fail"));
        assert_eq!(lines[3], "rejected");
    }

    #[test]
    fn test_scan_without_matches_succeeds_with_empty_json() {
        let tmp = TempDir::new().unwrap();
        let json = tmp.path().join("proofs.json");
        let (outcome, text) = run(&[
            "attest",
            "scan",
            "nothing that looks like a signature",
            "--json",
            json.to_str().unwrap(),
        ]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        assert!(text.contains("0 proofs"));
        assert_eq!(std::fs::read_to_string(&json).unwrap().trim(), "[]");
    }

    #[test]
    fn test_bulk_sign_without_valid_keys_fails() {
        let tmp = TempDir::new().unwrap();
        let keys = tmp.path().join("keys.txt");
        std::fs::write(&keys, "not a key\n# comment\n").unwrap();
        let (outcome, _) = run(&[
            "attest",
            "bulk-sign",
            "--keys",
            keys.to_str().unwrap(),
            "--message",
            "hello",
        ]);
        assert!(outcome.is_err());
    }

    #[test]
    fn test_bulk_sign_requires_a_message() {
        let err = Cli::try_parse_from(["attest", "bulk-sign", "--key", KEY_ONE])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_message_and_message_file_conflict() {
        let err = Cli::try_parse_from([
            "attest",
            "bulk-sign",
            "--key",
            KEY_ONE,
            "--message",
            "a",
            "--message-file",
            "m.txt",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_message_file_trailing_newline_ignored() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("message.txt");
        std::fs::write(&file, "proof of control\r\n").unwrap();

        let (from_file, text_file) = run(&[
            "attest",
            "bulk-sign",
            "--key",
            KEY_ONE,
            "--message-file",
            file.to_str().unwrap(),
        ]);
        let (from_flag, text_flag) = run(&[
            "attest",
            "bulk-sign",
            "--key",
            KEY_ONE,
            "--message",
            "proof of control",
        ]);
        assert_eq!(from_file.unwrap(), Outcome::Success);
        assert_eq!(from_flag.unwrap(), Outcome::Success);
        assert_eq!(text_file, text_flag);

        let records: serde_json::Value = serde_json::from_str(&text_file).unwrap();
        assert_eq!(records[0]["message"], "proof of control");
    }

    #[test]
    fn test_address_pins_seed_alpha() {
        let (outcome, text) = run(&["attest", "address", "--seed", "test-seed-alpha", "--json"]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            report["curveA_pubkey_hex"],
            "028c9bc82dd8c0f67e4d8f2e6542436f6c5aec50dc8f23661c684cdeeba4e195da"
        );
        assert_eq!(report["legacy_address"], "1AugnYP8YhX7W4G9UXKfw1j9YorPuqtcaJ");
        // Secrets only appear on request
        assert!(report.get("wif").is_none());
    }

    #[test]
    fn test_address_wif_and_branch() {
        let (outcome, text) = run(&[
            "attest",
            "address",
            "--seed",
            "test-seed-alpha",
            "--namespace",
            "vault",
            "--index",
            "2",
            "--testnet",
            "--wif",
            "--json",
        ]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(report["wif"].as_str().unwrap().starts_with('c'));
        assert!(report["witness_address"].as_str().unwrap().starts_with("tb1q"));
        assert_eq!(
            report["derivation_scheme_tag"],
            "sha256-expand/secp256k1+ed25519/v1#vault/2"
        );
        assert_ne!(
            report["curveA_pubkey_hex"],
            "028c9bc82dd8c0f67e4d8f2e6542436f6c5aec50dc8f23661c684cdeeba4e195da"
        );
    }

    #[test]
    fn test_address_rejects_bad_namespace() {
        let (outcome, _) = run(&[
            "attest",
            "address",
            "--seed",
            "test-seed-alpha",
            "--namespace",
            "a::b",
        ]);
        assert!(outcome.is_err());
    }
}
