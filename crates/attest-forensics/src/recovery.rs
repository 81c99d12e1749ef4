//! Recovery id selection for message signatures
//!
//! Bitcoin message signatures start with a header byte:
//!
//! | Header  | Key type              |
//! |---------|-----------------------|
//! | 27..=30 | uncompressed P2PKH    |
//! | 31..=34 | compressed P2PKH      |
//! | 35..=38 | P2SH-P2WPKH (BIP-137) |
//! | 39..=42 | P2WPKH (BIP-137)      |
//!
//! The header only suggests a recovery id; every id is still tried.

use attest_core::RECOVERY_IDS;

/// Lowest header byte of the message-signing ranges.
pub const HEADER_MIN: u8 = 27;

/// Highest header byte of the message-signing ranges.
pub const HEADER_MAX: u8 = 42;

/// Recovery id suggested by a header byte, if it falls in a known range.
pub fn guess_recovery_id(header: u8) -> Option<u8> {
    (HEADER_MIN..=HEADER_MAX)
        .contains(&header)
        .then(|| (header - HEADER_MIN) % 4)
}

/// Headers 27..=30 mark a signature made with an uncompressed key.
pub fn header_is_uncompressed(header: u8) -> bool {
    (HEADER_MIN..HEADER_MIN + 4).contains(&header)
}

/// Ordered recovery ids to try: the header's guess first, then 0..=3.
pub fn recovery_candidates(header: u8) -> Vec<u8> {
    let mut candidates = Vec::with_capacity(RECOVERY_IDS.len());
    candidates.extend(guess_recovery_id(header));
    for id in RECOVERY_IDS {
        if !candidates.contains(&id) {
            candidates.push(id);
        }
    }
    candidates
}
