//! Attest Forensics
//!
//! Finds base64 message signatures in arbitrary text and recovers the
//! public keys behind them.
//!
//! # Search
//!
//! ```text
//! blob ─► chunks (86-88 base64 chars) ─► 65-byte signatures
//!   for each signature: messages × digest schemes × recovery ids
//!   first combination that recovers and verifies wins
//! ```
//!
//! Nothing in a blob is an error: chunks that fail to decode or match are
//! counted and skipped.

pub mod extract;
pub mod messages;
pub mod recovery;
pub mod scanner;

pub use extract::{decode_chunk, extract_chunks, Chunk};
pub use messages::{MessageDictionary, DEFAULT_MESSAGES};
pub use recovery::{guess_recovery_id, header_is_uncompressed, recovery_candidates};
pub use scanner::{chain_fingerprint, AccountIdVariants, RecoveredProof, ScanReport, Scanner};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid witness prefix: {0}")]
    InvalidHrp(#[from] attest_core::AddressError),
}

/// Build a scanner from the usual inputs: extra messages, a messages file and an hrp.
pub fn build_scanner(
    extra_messages: &[String],
    messages_file: Option<&std::path::Path>,
    hrp: &str,
) -> Result<Scanner, ScanError> {
    let hrp = attest_core::parse_hrp(hrp)?;
    let mut dict = MessageDictionary::with_defaults();
    for message in extra_messages {
        dict.add(message);
    }
    if let Some(path) = messages_file {
        dict.load_file(path)?;
    }
    log::debug!("scanner dictionary holds {} messages", dict.len());
    Ok(Scanner::new(dict, hrp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scanner_rejects_bad_hrp() {
        assert!(matches!(
            build_scanner(&[], None, "not a valid hrp"),
            Err(ScanError::InvalidHrp(_))
        ));
    }

    #[test]
    fn test_build_scanner_merges_messages() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.txt");
        std::fs::write(&path, "from file\nhello\n").unwrap();

        let scanner = build_scanner(&["from flag".to_string()], Some(&path), "bc").unwrap();
        let messages = scanner.messages().messages();
        assert_eq!(messages.len(), DEFAULT_MESSAGES.len() + 2);
        assert_eq!(messages[messages.len() - 2], "from flag");
        assert_eq!(messages[messages.len() - 1], "from file");
    }
}
