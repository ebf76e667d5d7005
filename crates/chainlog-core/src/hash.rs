//! The chain digest.
//!
//! Hash input layout (bytes, in order, no separators):
//!   1. prev_hash as UTF-8 bytes
//!   2. timestamp as UTF-8 bytes
//!   3. action as UTF-8 bytes
//!
//! This layout is the on-disk chain format.  Changing it invalidates every
//! stored hash and requires bumping `CHAIN_FORMAT_VERSION`.

use sha2::{Digest, Sha256};

/// Version of the digest input layout above.  Durable stores record it and
/// refuse files written with a different layout.
pub const CHAIN_FORMAT_VERSION: u32 = 1;

/// Compute the SHA-256 digest linking an entry to its predecessor.
///
/// Returns a lowercase 64-character hex string.
pub fn digest(prev_hash: &str, timestamp: &str, action: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(action.as_bytes());

    hex::encode(hasher.finalize())
}

/// Compare two hex digests without short-circuiting on the first
/// differing byte.
pub fn digests_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
