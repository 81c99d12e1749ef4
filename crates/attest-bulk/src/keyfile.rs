//! Keyfile line parsing
//!
//! One private key per line, 64 hex characters with an optional `0x`
//! prefix. Blank lines and `#` comments are ignored. Anything else that
//! fails validation is reported as a skipped line; parsing never aborts.

use attest_core::{normalize_private_key_hex, parse_secp_private_key};
use secp256k1::SecretKey;
use serde::Serialize;

/// Comment marker for keyfile lines.
pub const COMMENT_MARKER: char = '#';

/// A line that was ignored during loading, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number
    pub line_no: usize,
    pub reason: String,
}

/// Result of interpreting one keyfile line.
#[derive(Debug)]
pub enum ParsedLine {
    /// Blank line or comment
    Ignored,
    /// A valid key, with its normalized hex
    Key { normalized: String, secret: SecretKey },
    /// Not a usable key
    Invalid(String),
}

/// Interpret a single keyfile line.
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
        return ParsedLine::Ignored;
    }
    match parse_secp_private_key(trimmed) {
        Ok(secret) => ParsedLine::Key {
            normalized: normalize_private_key_hex(trimmed),
            secret,
        },
        Err(e) => ParsedLine::Invalid(e.to_string()),
    }
}

/// Iterate keyfile lines with their 1-based numbers.
pub fn parse_lines(text: &str) -> impl Iterator<Item = (usize, ParsedLine)> + '_ {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, parse_line(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_comments_and_blanks_ignored() {
        assert!(matches!(parse_line(""), ParsedLine::Ignored));
        assert!(matches!(parse_line("   \t"), ParsedLine::Ignored));
        assert!(matches!(parse_line("# hot wallet"), ParsedLine::Ignored));
        assert!(matches!(parse_line("  # indented"), ParsedLine::Ignored));
    }

    #[test]
    fn test_prefixed_and_uppercase_keys_normalize() {
        let upper = format!("0X{}", KEY_ONE.to_uppercase());
        for input in [KEY_ONE.to_string(), format!("0x{}", KEY_ONE), upper] {
            match parse_line(&input) {
                ParsedLine::Key { normalized, .. } => assert_eq!(normalized, KEY_ONE),
                other => panic!("expected key for {}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_invalid_scalars_rejected() {
        let zero = "0".repeat(64);
        let too_big = "f".repeat(64);
        let not_hex = "g".repeat(64);
        for input in [zero.as_str(), too_big.as_str(), not_hex.as_str(), "1234", "zz"] {
            assert!(
                matches!(parse_line(input), ParsedLine::Invalid(_)),
                "{} should be invalid",
                input
            );
        }
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let text = format!("# header\n\n{}\nnoise\n", KEY_ONE);
        let parsed: Vec<_> = parse_lines(&text).collect();
        assert_eq!(parsed.len(), 4);
        assert!(matches!(parsed[2], (3, ParsedLine::Key { .. })));
        assert!(matches!(parsed[3], (4, ParsedLine::Invalid(_))));
    }
}
