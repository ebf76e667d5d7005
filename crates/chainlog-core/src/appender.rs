//! The appender: the only writer of the chain.
//!
//! Every append follows the same protocol:
//!
//!   validate → take writer role → read tail → timestamp + digest → fenced append
//!
//! The writer role (a process-wide mutex) serializes all appends made through
//! this `Appender`, so two callers can never hash against the same tail.  The
//! store's fenced `append_entry` is the second line: if something outside the
//! process extended the tail in between, the store reports a conflict and the
//! appender re-reads the tail and tries again, up to `max_retries` times.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use chainlog_contracts::{BatchOutcome, ChainError, ChainResult, Entry, NewEntry};

use crate::{hash::digest, traits::ChainStore};

/// Conflict retries allowed after the first attempt, by default.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Single-entry and batch append API over a shared `ChainStore`.
///
/// Share one `Appender` (behind an `Arc`) between all producers of a process.
/// Two `Appender`s over the same store still cannot fork the chain, but they
/// fall back to conflict-and-retry instead of waiting on each other.
pub struct Appender {
    store: Arc<dyn ChainStore>,
    writer: Mutex<()>,
    max_retries: u32,
}

impl Appender {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the number of conflict retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Append one action to the chain.
    ///
    /// The action is trimmed before hashing and storage.
    ///
    /// # Errors
    ///
    /// - `Validation` if the action is blank; nothing is written.
    /// - `RetryExhausted` if the tail kept moving underneath every attempt.
    /// - `Storage` if the store failed; nothing is written.
    pub fn append(&self, action: &str) -> ChainResult<Entry> {
        let action = validate_action(action)?;
        let _writer = self.writer_role()?;
        self.append_locked(action)
    }

    /// Append each non-blank action as its own chain step, in input order.
    ///
    /// Blank items are skipped silently.  The writer role is held for the
    /// whole batch, so no other append can land between two of its entries.
    /// Callers with very large batches should split them to avoid starving
    /// other producers.
    ///
    /// # Errors
    ///
    /// Returns `BatchAborted` on the first storage failure or exhausted
    /// retry.  Entries committed before the failure stay in the chain and are
    /// counted in the error.
    pub fn batch_append<S: AsRef<str>>(&self, actions: &[S]) -> ChainResult<BatchOutcome> {
        let _writer = self.writer_role()?;
        let mut outcome = BatchOutcome::default();

        for (index, raw) in actions.iter().enumerate() {
            let action = match validate_action(raw.as_ref()) {
                Ok(action) => action,
                Err(_) => {
                    debug!(index, "skipping blank batch item");
                    continue;
                }
            };

            match self.append_locked(action) {
                Ok(entry) => outcome.logged.push(entry),
                Err(e) => {
                    warn!(
                        index,
                        committed = outcome.logged.len(),
                        error = %e,
                        "batch append aborted"
                    );
                    return Err(ChainError::BatchAborted {
                        committed: outcome.logged.len(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome.count = outcome.logged.len();
        info!(
            submitted = actions.len(),
            count = outcome.count,
            "batch appended"
        );
        Ok(outcome)
    }

    fn writer_role(&self) -> ChainResult<MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|e| ChainError::Storage {
            reason: format!("writer lock poisoned: {}", e),
        })
    }

    /// Run the read-tail / hash / fenced-append loop.  Caller holds the
    /// writer role.
    fn append_locked(&self, action: &str) -> ChainResult<Entry> {
        let attempts = self.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let prev_hash = self.store.last_hash()?;
            let timestamp = now_timestamp();
            let hash = digest(&prev_hash, &timestamp, action);

            let new_entry = NewEntry {
                timestamp,
                action: action.to_string(),
                hash,
            };

            match self.store.append_entry(new_entry, &prev_hash) {
                Ok(entry) => {
                    debug!(
                        id = entry.id,
                        hash = %entry.hash,
                        attempt,
                        "entry appended"
                    );
                    return Ok(entry);
                }
                Err(ChainError::Conflict { expected, actual }) => {
                    warn!(
                        attempt,
                        expected = %expected,
                        actual = %actual,
                        "tail moved during append, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ChainError::RetryExhausted { attempts })
    }
}

/// Trim `action` and reject it if nothing is left.
pub fn validate_action(action: &str) -> ChainResult<&str> {
    let trimmed = action.trim();
    if trimmed.is_empty() {
        return Err(ChainError::Validation {
            reason: "action must not be empty or whitespace-only".to_string(),
        });
    }
    Ok(trimmed)
}

/// Current UTC time in the fixed-width chain timestamp format,
/// e.g. `2025-08-09T12:00:00.123456Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
