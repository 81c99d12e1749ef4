//! Candidate chunk extraction
//!
//! Finds substrings shaped like a base64-encoded 65-byte signature:
//! 86 to 88 base64 characters followed by up to two `=`. Matches are taken
//! left to right and never overlap.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

/// Shortest run of base64 characters considered.
pub const MIN_CHUNK_CHARS: usize = 86;

/// Longest run of base64 characters taken in one chunk.
pub const MAX_CHUNK_CHARS: usize = 88;

/// Maximum trailing padding characters.
pub const MAX_PADDING: usize = 2;

/// Header byte plus 64-byte compact signature.
pub const SIGNATURE_LEN: usize = 65;

// Wallets differ on whether they keep the trailing `=`.
const CHUNK_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A substring of the blob that looks like a base64 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset in the blob
    pub offset: usize,
    pub text: &'a str,
}

fn is_base64_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Extract candidate chunks from arbitrary text.
pub fn extract_chunks(blob: &str) -> Vec<Chunk<'_>> {
    let bytes = blob.as_bytes();
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if !is_base64_char(bytes[pos]) {
            pos += 1;
            continue;
        }

        let run_start = pos;
        let mut run_end = pos;
        while run_end < bytes.len() && is_base64_char(bytes[run_end]) {
            run_end += 1;
        }

        let mut start = run_start;
        while run_end - start >= MIN_CHUNK_CHARS {
            let mut end = start + (run_end - start).min(MAX_CHUNK_CHARS);
            let body_end = end;
            if end == run_end {
                while end < bytes.len() && end - body_end < MAX_PADDING && bytes[end] == b'=' {
                    end += 1;
                }
            }
            chunks.push(Chunk {
                offset: start,
                text: &blob[start..end],
            });
            start = end;
            if end > run_end {
                break;
            }
        }

        // Skip past any padding consumed by the last chunk
        pos = run_end.max(start);
    }
    chunks
}

/// Decode a chunk into a 65-byte signature, or `None` if it is anything else.
pub fn decode_chunk(chunk: &str) -> Option<[u8; SIGNATURE_LEN]> {
    let decoded = CHUNK_ENGINE.decode(chunk).ok()?;
    decoded.try_into().ok()
}
