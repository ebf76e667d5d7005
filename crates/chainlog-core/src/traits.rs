//! The storage seam of the chain.
//!
//! `ChainStore` is the only way entries reach or leave durable storage.  It
//! has no update or delete operation: the only mutation is a fenced append
//! that succeeds only while the tail is still the one the caller hashed
//! against.

use std::collections::VecDeque;

use chainlog_contracts::{
    ChainResult, Entry, EntryFilter, NewEntry, GENESIS_HASH,
};

/// Number of entries `EntryRange` fetches per round-trip by default.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Ordered, append-only persistence for chain entries.
///
/// Implementations must make `append_entry` atomic: the tail check, id
/// assignment and insert either all happen or none do.
pub trait ChainStore: Send + Sync {
    /// The id and hash of the most recent entry, or `None` when empty.
    fn tip(&self) -> ChainResult<Option<(u64, String)>>;

    /// Hash of the most recent entry, or `GENESIS_HASH` when empty.
    fn last_hash(&self) -> ChainResult<String> {
        Ok(self
            .tip()?
            .map(|(_, hash)| hash)
            .unwrap_or_else(|| GENESIS_HASH.to_string()))
    }

    /// Persist `entry` as the new tail, linked to `expected_prev_hash`.
    ///
    /// Assigns `id = tail id + 1` (1 for the first entry).  Returns
    /// `ChainError::Conflict` without touching storage when the current tail
    /// hash differs from `expected_prev_hash`.
    fn append_entry(&self, entry: NewEntry, expected_prev_hash: &str) -> ChainResult<Entry>;

    /// Up to `limit` entries with `from_id <= id <= to_id`, ascending.
    fn read_page(&self, from_id: u64, to_id: u64, limit: usize) -> ChainResult<Vec<Entry>>;

    /// Entries matching `filter`, in id order.
    fn query(&self, filter: &EntryFilter) -> ChainResult<Vec<Entry>>;

    /// Number of persisted entries.
    fn len(&self) -> ChainResult<u64>;

    /// Number of stored rows with an id of at most `to_id`, counting any row
    /// whose id is below 1.
    ///
    /// The default suits stores that only ever hold the ids `append_entry`
    /// assigned.  A store that can hold rows written around it must count
    /// them for real, so the verifier can tell them apart from the chain.
    fn count_through(&self, to_id: u64) -> ChainResult<u64> {
        Ok(self.len()?.min(to_id))
    }

    fn is_empty(&self) -> ChainResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<'s> dyn ChainStore + 's {
    /// Lazily iterate `from_id..=to_id` in ascending id order.
    pub fn read_range(&self, from_id: u64, to_id: u64) -> EntryRange<'_> {
        EntryRange::new(self, from_id, to_id)
    }

    /// Lazily iterate the whole chain.
    pub fn read_all(&self) -> EntryRange<'_> {
        EntryRange::new(self, 1, u64::MAX)
    }
}

/// A lazy, paged cursor over a range of entries.
///
/// Only one page is held in memory at a time, so arbitrarily long chains can
/// be walked.  The cursor can be restarted from any id with `resume_after`.
/// After a storage error the iterator is fused.
pub struct EntryRange<'a> {
    store: &'a dyn ChainStore,
    next_id: u64,
    to_id: u64,
    page_size: usize,
    buffer: VecDeque<Entry>,
    exhausted: bool,
}

impl<'a> EntryRange<'a> {
    pub fn new(store: &'a dyn ChainStore, from_id: u64, to_id: u64) -> Self {
        Self {
            store,
            next_id: from_id.max(1),
            to_id,
            page_size: DEFAULT_PAGE_SIZE,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The id the next fetch will start from.
    pub fn cursor(&self) -> u64 {
        self.buffer.front().map_or(self.next_id, |e| e.id)
    }

    /// Restart the walk just after `id`, discarding any buffered page.
    pub fn resume_after(&mut self, id: u64) {
        self.next_id = id.saturating_add(1);
        self.buffer.clear();
        self.exhausted = false;
    }

    fn fill(&mut self) -> ChainResult<()> {
        let page = self
            .store
            .read_page(self.next_id, self.to_id, self.page_size)?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for EntryRange<'_> {
    type Item = ChainResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if self.exhausted || self.next_id > self.to_id {
                return None;
            }
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        let entry = self.buffer.pop_front()?;
        self.next_id = entry.id.saturating_add(1);
        Some(Ok(entry))
    }
}
