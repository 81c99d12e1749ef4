//! attest: deterministic cross-curve attestation and signature forensics
//!
//! # Usage
//!
//! ```bash
//! attest forge --seed "correct horse" --note "cold storage"  # writes attest-out/{manifest,bundle}.json
//! attest verify attest-out/manifest.json attest-out/bundle.json
//! attest bulk-sign --keys keys.txt --message "proof of control" --out sigs.json
//! attest scan dump.txt --msg "I control this address" --json proofs.json
//! attest address --seed "correct horse" --namespace vault --index 2 --testnet --wif
//! ```

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "attest",
    version,
    about = "Deterministic cross-curve attestation forge and signature forensics"
)]
struct Cli {
    /// Config file (TOML). Environment variables override it; flags override both.
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive keys from a seed, then write a signed manifest and bundle
    Forge(ForgeArgs),
    /// Check a bundle against a manifest; exits 1 if any check fails
    Verify(VerifyArgs),
    /// Sign one message with every key in a keyfile
    BulkSign(BulkSignArgs),
    /// Recover signer keys from base64 signatures in a text blob.
    /// Without --target, hits only show that some key verifies; they do not
    /// identify a signer
    Scan(ScanArgs),
    /// Print the keys and addresses a seed derives, without signing
    Address(AddressArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SeedSource {
    /// Seed phrase
    #[arg(long)]
    seed: Option<String>,

    /// File holding the seed phrase (trailing newline ignored)
    #[arg(long, value_name = "PATH")]
    seed_file: Option<PathBuf>,
}

#[derive(Args)]
struct PathArgs {
    /// Derivation namespace (default: core)
    #[arg(long, value_name = "NAME")]
    namespace: Option<String>,

    /// Index within the namespace
    #[arg(long, default_value_t = 0)]
    index: u32,
}

#[derive(Args)]
struct ForgeArgs {
    #[command(flatten)]
    seed: SeedSource,

    #[command(flatten)]
    path: PathArgs,

    /// Anchor phrase (default: seed fingerprint)
    #[arg(long)]
    anchor: Option<String>,

    /// Glyph tag
    #[arg(long)]
    glyph: Option<String>,

    #[arg(long)]
    note: Option<String>,

    /// RFC 3339 timestamp (default: now)
    #[arg(long)]
    timestamp: Option<String>,

    /// Manifest id (default: derived from the public key)
    #[arg(long)]
    id: Option<String>,

    /// Witness address prefix
    #[arg(long)]
    hrp: Option<String>,

    /// Digest scheme: sha256, sha256d or keccak256
    #[arg(long, value_name = "TAG")]
    digest: Option<String>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

#[derive(Args)]
struct VerifyArgs {
    /// Manifest file
    manifest: PathBuf,

    /// Bundle file
    bundle: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
#[group(id = "message_source", required = true, multiple = false)]
struct MessageSource {
    /// Message to sign
    #[arg(long)]
    message: Option<String>,

    /// File holding the message to sign (trailing newline ignored)
    #[arg(long, value_name = "PATH")]
    message_file: Option<PathBuf>,
}

#[derive(Args)]
struct BulkSignArgs {
    /// Keyfile: one 64-hex private key per line
    #[arg(long, value_name = "PATH")]
    keys: Option<PathBuf>,

    /// Extra private key (repeatable)
    #[arg(long, value_name = "HEX")]
    key: Vec<String>,

    #[command(flatten)]
    message: MessageSource,

    /// Write signature records here instead of stdout
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct ScanArgs {
    /// Blob text, or a path to a file holding it (stdin if omitted)
    input: Option<String>,

    /// Extra candidate message (repeatable)
    #[arg(long = "msg", value_name = "TEXT")]
    msgs: Vec<String>,

    /// File of candidate messages, one per line
    #[arg(long, value_name = "PATH")]
    messages_file: Option<PathBuf>,

    /// Witness address prefix
    #[arg(long)]
    hrp: Option<String>,

    /// Only report keys matching this address or public key (repeatable).
    /// Legacy targets match both compressed and uncompressed forms
    #[arg(long, value_name = "ADDR")]
    target: Vec<String>,

    /// Write proofs as a JSON array to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(Args)]
struct AddressArgs {
    #[command(flatten)]
    seed: SeedSource,

    #[command(flatten)]
    path: PathArgs,

    /// Witness address prefix (default: tb with --testnet)
    #[arg(long)]
    hrp: Option<String>,

    /// Also print the secp256k1 secret in Wallet Import Format
    #[arg(long)]
    wif: bool,

    /// Use the testnet WIF prefix
    #[arg(long)]
    testnet: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    // Seeds and private keys pass through this process
    attest_core::memory::disable_core_dumps();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::AttestConfig::load(cli.config.as_deref())?;

    env_logger::Builder::new()
        .parse_filters(&config.general.log_level)
        .init();

    let mut stdout = std::io::stdout().lock();
    let outcome = commands::dispatch(&config, cli.command, &mut stdout)?;
    Ok(outcome.into())
}
