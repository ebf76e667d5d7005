//! Error types for the chainlog append and storage paths.
//!
//! Every fallible operation returns `ChainResult<T>`.  A detected tamper is
//! not an error: it is reported through `VerifyReport`.

use thiserror::Error;

/// The unified error type for chainlog.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The action was empty or whitespace-only.  Nothing was written.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The chain tail moved between reading it and appending against it.
    ///
    /// Retried inside the appender; callers only see `RetryExhausted`.
    #[error("tail conflict: expected prev_hash {expected}, found {actual}")]
    Conflict { expected: String, actual: String },

    /// Tail conflicts persisted past the configured retry bound.
    #[error("append gave up after {attempts} conflicting attempts")]
    RetryExhausted { attempts: u32 },

    /// The durable medium failed.  The chain is unchanged.
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// A batch stopped on a storage failure after `committed` entries were
    /// durably appended.
    #[error("batch aborted after {committed} committed entries: {reason}")]
    BatchAborted { committed: usize, reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl ChainError {
    /// Shorthand used by store implementations when mapping driver errors.
    pub fn storage(reason: impl std::fmt::Display) -> Self {
        ChainError::Storage {
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the chainlog crates.
pub type ChainResult<T> = Result<T, ChainError>;
