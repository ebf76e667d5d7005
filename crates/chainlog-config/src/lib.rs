//! # chainlog-config
//!
//! TOML configuration for the chainlog store, appender and verifier.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use chainlog_config::ChainlogConfig;
//!
//! let config = ChainlogConfig::load(None)?;
//! let store = SqliteChainStore::open(&config.store.path, config.store.busy_timeout())?;
//! ```
//!
//! Missing sections and keys fall back to their defaults; unknown keys are
//! rejected so typos do not silently change behaviour.

pub mod loader;
pub mod settings;

pub use loader::{CONFIG_ENV, DB_ENV};
pub use settings::{AppendSettings, ChainlogConfig, StoreSettings, VerifySettings};

// ── Tests ─────────────────────────────────────────────────────────────────────
