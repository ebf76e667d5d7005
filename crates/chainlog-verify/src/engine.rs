//! Chain verifier.
//!
//! `ChainVerifier` walks the chain in ascending id order and recomputes every
//! digest.  For each entry it checks, in order:
//!
//! 1. **Id continuity**: the id follows its predecessor (an entry removed
//!    out-of-band leaves a gap).
//! 2. **Prev-hash linkage**: `prev_hash` equals the running hash of the
//!    chain (`GENESIS_HASH` before the first entry).
//! 3. **Hash correctness**: `hash` equals
//!    `digest(running hash, timestamp, action)`.
//!
//! The walk stops at the first failing entry: once a link is broken, every
//! later hash proves nothing.  A scan from genesis also counts the stored
//! rows up to the tail: rows the walk never reached (ids below 1) mean
//! something was written around the chain.  Verification only reads, takes no writer
//! lock, and ignores entries appended after the scan started.

use std::sync::Arc;

use tracing::{debug, info, warn};

use chainlog_contracts::{ChainResult, Entry, TamperKind, VerifyReport, GENESIS_HASH};
use chainlog_core::{
    hash::{digest, digests_equal},
    traits::DEFAULT_PAGE_SIZE,
    ChainStore,
};

/// Read-only verifier over a shared `ChainStore`.
pub struct ChainVerifier {
    store: Arc<dyn ChainStore>,
    page_size: usize,
}

impl ChainVerifier {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Number of entries fetched from the store per round-trip.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Verify the whole chain as it stood when the call began.
    ///
    /// An empty chain is `Ok`.
    ///
    /// # Errors
    ///
    /// Only storage failures are errors; tampering is reported in the
    /// returned `VerifyReport`.
    pub fn verify(&self) -> ChainResult<VerifyReport> {
        self.verify_range(1, u64::MAX)
    }

    /// Verify entries `from_id..=to_id`.
    ///
    /// With `from_id <= 1` the walk is anchored at `GENESIS_HASH`.  Otherwise
    /// the first scanned entry's stored `prev_hash` is trusted as the anchor,
    /// so a suffix scan cannot see tampering before `from_id`.
    pub fn verify_range(&self, from_id: u64, to_id: u64) -> ChainResult<VerifyReport> {
        // Freeze the upper bound so concurrent appends are not chased.
        let Some((tail_id, _)) = self.store.tip()? else {
            debug!("chain is empty, nothing to verify");
            return Ok(VerifyReport::ok(0));
        };
        let to_id = to_id.min(tail_id);

        let mut walk = if from_id <= 1 {
            ChainWalk::from_genesis()
        } else {
            ChainWalk::from_first_entry()
        };

        for entry in self
            .store
            .read_range(from_id, to_id)
            .with_page_size(self.page_size)
        {
            let entry = entry?;
            if let Some(kind) = walk.check(&entry) {
                let report = VerifyReport::tampered(entry.id, kind, walk.checked);
                warn!(
                    tampered_id = entry.id,
                    checked = walk.checked,
                    reason = %report.message(),
                    "chain verification failed"
                );
                return Ok(report);
            }
        }

        if from_id <= 1 {
            let stored = self.store.count_through(to_id)?;
            if stored > walk.checked {
                let report = VerifyReport::stray_rows(stored - walk.checked, walk.checked);
                warn!(
                    stored,
                    checked = walk.checked,
                    reason = %report.message(),
                    "chain verification failed"
                );
                return Ok(report);
            }
        }

        info!(
            from_id,
            to_id,
            checked = walk.checked,
            "chain verified"
        );
        Ok(VerifyReport::ok(walk.checked))
    }
}

/// Verify an in-memory chain, e.g. one exported from a store.
///
/// The slice must start at the genesis entry.
pub fn verify_chain(entries: &[Entry]) -> VerifyReport {
    let mut walk = ChainWalk::from_genesis();
    for entry in entries {
        if let Some(kind) = walk.check(entry) {
            return VerifyReport::tampered(entry.id, kind, walk.checked);
        }
    }
    VerifyReport::ok(walk.checked)
}

// ── Walk state ────────────────────────────────────────────────────────────────

/// Running state of a verification walk.
///
/// `None` fields are seeded from the first entry seen (suffix scans).
struct ChainWalk {
    running_hash: Option<String>,
    expected_id: Option<u64>,
    checked: u64,
}

impl ChainWalk {
    fn from_genesis() -> Self {
        Self {
            running_hash: Some(GENESIS_HASH.to_string()),
            expected_id: Some(1),
            checked: 0,
        }
    }

    fn from_first_entry() -> Self {
        Self {
            running_hash: None,
            expected_id: None,
            checked: 0,
        }
    }

    /// Check one entry and advance.  Returns why it failed, if it did.
    fn check(&mut self, entry: &Entry) -> Option<TamperKind> {
        let expected_id = *self.expected_id.get_or_insert(entry.id);
        if entry.id != expected_id {
            return Some(TamperKind::IdGap {
                expected: expected_id,
            });
        }

        let running = self
            .running_hash
            .get_or_insert_with(|| entry.prev_hash.clone());
        if !digests_equal(&entry.prev_hash, running) {
            return Some(TamperKind::BrokenLink);
        }

        let recomputed = digest(running, &entry.timestamp, &entry.action);
        if !digests_equal(&recomputed, &entry.hash) {
            return Some(TamperKind::HashMismatch);
        }

        *running = entry.hash.clone();
        self.expected_id = Some(expected_id + 1);
        self.checked += 1;
        None
    }
}
