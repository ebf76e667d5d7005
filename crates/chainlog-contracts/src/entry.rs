//! Chain entry types.
//!
//! An `Entry` is one step in the hash chain.  It is created only by the
//! appender, assigned its `id` by the store, and never modified afterwards.

use serde::{Deserialize, Serialize};

/// The sentinel `prev_hash` of the first entry in every chain.
///
/// 64 hex zeros, the same width as a real SHA-256 digest.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A persisted link in the audit chain.
///
/// `hash` commits to `prev_hash`, `timestamp` and `action`.  `id` is not part
/// of the digest; the verifier checks id continuity separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Position in the chain, starting at 1, gapless.
    pub id: u64,

    /// UTC time of the append, RFC 3339 with microseconds.
    pub timestamp: String,

    /// The opaque action text supplied by the producer (already trimmed).
    pub action: String,

    /// `hash` of the preceding entry, or `GENESIS_HASH` for id 1.
    pub prev_hash: String,

    /// Hex SHA-256 of `prev_hash || timestamp || action`.
    pub hash: String,
}

impl Entry {
    /// The boundary view returned to producers after an append.
    pub fn receipt(&self) -> crate::receipt::AppendReceipt {
        crate::receipt::AppendReceipt {
            timestamp: self.timestamp.clone(),
            action: self.action.clone(),
            hash: self.hash.clone(),
        }
    }
}

/// An entry that has been hashed but not yet assigned an id.
///
/// Handed to `ChainStore::append_entry` together with the tail hash it was
/// computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub timestamp: String,
    pub action: String,
    pub hash: String,
}

impl NewEntry {
    /// Attach the store-assigned id and the tail the entry was linked to.
    pub fn into_entry(self, id: u64, prev_hash: impl Into<String>) -> Entry {
        Entry {
            id,
            timestamp: self.timestamp,
            action: self.action,
            prev_hash: prev_hash.into(),
            hash: self.hash,
        }
    }
}
