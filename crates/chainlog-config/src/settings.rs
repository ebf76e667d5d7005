//! Configuration schema.
//!
//! Every section and field has a default, so an empty document is a valid
//! configuration.
//!
//! Example in TOML:
//! ```toml
//! [store]
//! path = "C:/AuditData/logs.db"
//! busy_timeout_ms = 5000
//!
//! [append]
//! max_retries = 3
//!
//! [verify]
//! page_size = 256
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainlogConfig {
    pub store: StoreSettings,
    pub append: AppendSettings,
    pub verify: VerifySettings,
}

/// Where the chain lives and how long writers wait for each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    /// SQLite database file.  Created on first open.
    pub path: PathBuf,

    /// How long an append waits for another connection's write lock.
    pub busy_timeout_ms: u64,
}

impl StoreSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("audit_logs.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppendSettings {
    /// Conflict retries after the first attempt before `RetryExhausted`.
    pub max_retries: u32,

    /// Largest batch submitted under one writer-role hold; bigger inputs are
    /// split by the caller.
    pub max_batch: usize,
}

impl Default for AppendSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_batch: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifySettings {
    /// Entries fetched per round-trip while walking the chain.
    pub page_size: usize,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self { page_size: 256 }
    }
}
