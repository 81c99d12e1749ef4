//! Binary Merkle commitment over ordered buffers
//!
//! Leaves are `SHA256(buffer)`. Each layer hashes `left || right` pairs; an
//! odd layer pairs its last node with itself. Order matters: the forge
//! commits to `[manifest, curve A signature, curve B signature]`.

use attest_core::hashing::sha256;

/// Root of an empty tree.
pub const EMPTY_ROOT: [u8; 32] = [0u8; 32];

/// Compute the Merkle root of `buffers` in the given order.
pub fn merkle_root<B: AsRef<[u8]>>(buffers: &[B]) -> [u8; 32] {
    if buffers.is_empty() {
        return EMPTY_ROOT;
    }

    let mut level: Vec<[u8; 32]> = buffers.iter().map(|b| sha256(b.as_ref())).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let mut joined = [0u8; 64];
                joined[..32].copy_from_slice(&left);
                joined[32..].copy_from_slice(&right);
                sha256(&joined)
            })
            .collect();
    }
    level[0]
}
