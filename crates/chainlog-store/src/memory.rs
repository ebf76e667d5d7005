//! In-memory implementation of `ChainStore`.
//!
//! `InMemoryChainStore` is the reference implementation of the `ChainStore`
//! trait.  It keeps all entries in a `Vec` protected by a `Mutex`; the fence
//! check and the push happen under the same lock, which makes
//! `append_entry` atomic.
//!
//! Use `export()` to take a copy of the chain and `from_entries()` to load a
//! previously exported chain back, e.g. to verify it offline.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use chainlog_contracts::{
    ChainError, ChainResult, Entry, EntryFilter, NewEntry, GENESIS_HASH,
};
use chainlog_core::ChainStore;

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// All entries, in id order.  `entries[i].id` is normally `i + 1`, but a
    /// store restored with `from_entries` holds whatever it was given.
    pub(crate) entries: Vec<Entry>,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// A volatile, append-only chain store.
///
/// Cloning is cheap and clones share the same chain.
#[derive(Clone)]
pub struct InMemoryChainStore {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryChainStore {
    pub fn new() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Restore a store from previously exported entries.
    ///
    /// The entries are taken as-is and are not validated: this is how an
    /// exported chain is loaded for offline verification.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState { entries })),
        }
    }

    /// A copy of every entry currently in the chain.
    pub fn export(&self) -> ChainResult<Vec<Entry>> {
        Ok(self.lock()?.entries.clone())
    }

    fn lock(&self) -> ChainResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| ChainError::Storage {
            reason: format!("chain state lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── ChainStore impl ───────────────────────────────────────────────────────────

impl ChainStore for InMemoryChainStore {
    fn tip(&self) -> ChainResult<Option<(u64, String)>> {
        Ok(self.lock()?.entries.last().map(|e| (e.id, e.hash.clone())))
    }

    fn append_entry(&self, entry: NewEntry, expected_prev_hash: &str) -> ChainResult<Entry> {
        let mut state = self.lock()?;

        let (tail_id, actual) = state
            .entries
            .last()
            .map(|e| (e.id, e.hash.as_str()))
            .unwrap_or((0, GENESIS_HASH));

        if actual != expected_prev_hash {
            return Err(ChainError::Conflict {
                expected: expected_prev_hash.to_string(),
                actual: actual.to_string(),
            });
        }

        let entry = entry.into_entry(tail_id + 1, expected_prev_hash);
        state.entries.push(entry.clone());

        debug!(id = entry.id, "entry stored in memory");
        Ok(entry)
    }

    fn read_page(&self, from_id: u64, to_id: u64, limit: usize) -> ChainResult<Vec<Entry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.id >= from_id && e.id <= to_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn query(&self, filter: &EntryFilter) -> ChainResult<Vec<Entry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.id >= 1 && filter.matches(&e.timestamp, &e.action))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn len(&self) -> ChainResult<u64> {
        Ok(self.lock()?.entries.len() as u64)
    }

    fn count_through(&self, to_id: u64) -> ChainResult<u64> {
        let state = self.lock()?;
        Ok(state.entries.iter().filter(|e| e.id <= to_id).count() as u64)
    }
}
