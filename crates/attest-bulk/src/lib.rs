//! Attest Bulk Signer
//!
//! Loads many secp256k1 private keys from noisy keyfiles and signs one
//! message with each of them.
//!
//! # Policy
//!
//! - Invalid keyfile lines are skipped and reported, never fatal
//! - Keys are deduplicated on their normalized hex (lower-case, no `0x`)
//! - Output order follows load order
//! - Signing a new message replaces the previous signature list
//!
//! # Example
//!
//! ```
//! use attest_bulk::KeyRing;
//!
//! let mut ring = KeyRing::new();
//! let report = ring.load_str(
//!     "# test key\n0x0000000000000000000000000000000000000000000000000000000000000001\nnot-a-key\n",
//! );
//! assert_eq!(report.loaded, 1);
//! assert_eq!(report.skipped.len(), 1);
//!
//! let signed = ring.sign("hello").unwrap();
//! assert_eq!(signed.records[0].account_id, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
//! ```

pub mod keyfile;
pub mod ring;

pub use keyfile::{parse_line, ParsedLine, SkippedLine};
pub use ring::{KeyRecord, KeyRing, LoadReport, SignReport, SignatureRecord, SkippedKey};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyRingError {
    #[error("Failed to read keyfile {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(#[from] attest_core::KeyError),

    #[error("No keys loaded")]
    NoKeys,
}
