//! CLI configuration, parsed from an optional TOML file plus environment overrides.
//!
//! Priority: command-line flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use attest_core::{parse_hrp, DigestScheme, Hrp, DEFAULT_WITNESS_HRP};
use attest_forge::manifest::DEFAULT_GLYPH_TAG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttestConfig {
    #[serde(default)]
    pub general: GeneralSection,

    #[serde(default)]
    pub forge: ForgeSection,

    #[serde(default)]
    pub scanner: ScannerSection,

    #[serde(default)]
    pub signer: SignerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeSection {
    /// Where manifest.json and bundle.json are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Digest scheme tag for manifests
    #[serde(default = "default_digest_algorithm")]
    pub digest_algorithm: String,

    #[serde(default = "default_glyph_tag")]
    pub glyph_tag: String,
}

impl Default for ForgeSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            digest_algorithm: default_digest_algorithm(),
            glyph_tag: default_glyph_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSection {
    /// Witness address prefix (bc, tb, bcrt, ...)
    #[serde(default = "default_hrp")]
    pub hrp: String,

    /// Messages tried in addition to the built-in set
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            hrp: default_hrp(),
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerSection {
    /// Keyfile used when no keys are given on the command line
    pub keyfile: Option<PathBuf>,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("attest-out")
}

fn default_digest_algorithm() -> String {
    DigestScheme::Sha256.tag().to_string()
}

fn default_glyph_tag() -> String {
    DEFAULT_GLYPH_TAG.to_string()
}

fn default_hrp() -> String {
    DEFAULT_WITNESS_HRP.to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl AttestConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AttestConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise, then apply env overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config
            .validate()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `ATTEST_LOG_LEVEL`
    /// - `ATTEST_OUTPUT_DIR`
    /// - `ATTEST_HRP`
    /// - `ATTEST_KEYFILE`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ATTEST_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Ok(v) = std::env::var("ATTEST_OUTPUT_DIR") {
            self.forge.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ATTEST_HRP") {
            self.scanner.hrp = v;
        }
        if let Ok(v) = std::env::var("ATTEST_KEYFILE") {
            self.signer.keyfile = Some(PathBuf::from(v));
        }
    }

    /// Digest scheme for the forge path.
    pub fn digest_scheme(&self) -> Result<DigestScheme> {
        let scheme: DigestScheme = self
            .forge
            .digest_algorithm
            .parse()
            .with_context(|| "forge.digest_algorithm is not a known digest tag")?;
        anyhow::ensure!(
            scheme != DigestScheme::BitcoinMessage,
            "forge.digest_algorithm cannot be bitcoin-message"
        );
        Ok(scheme)
    }

    pub fn hrp(&self) -> Result<Hrp> {
        parse_hrp(&self.scanner.hrp).with_context(|| "scanner.hrp is not a valid prefix")
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.forge.output_dir.as_os_str().is_empty(),
            "forge.output_dir must not be empty"
        );
        self.digest_scheme()?;
        self.hrp()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
