//! Loading and validating `ChainlogConfig`.
//!
//! Lookup order for `load`:
//!
//! 1. An explicit path, if given; it must exist.
//! 2. `$CHAINLOG_CONFIG`, if set; it must exist.
//! 3. Built-in defaults.
//!
//! `$CHAINLOG_DB` overrides `store.path` after the document is read.

use std::path::Path;

use tracing::debug;

use chainlog_contracts::{ChainError, ChainResult};

use crate::settings::ChainlogConfig;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "CHAINLOG_CONFIG";

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "CHAINLOG_DB";

impl ChainlogConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `ChainError::Config` if the TOML is malformed, has unknown
    /// keys, or holds out-of-range values.
    pub fn from_toml_str(s: &str) -> ChainResult<Self> {
        let config: ChainlogConfig = toml::from_str(s).map_err(|e| ChainError::Config {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> ChainResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ChainError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Resolve configuration from `explicit`, the environment, or defaults.
    pub fn load(explicit: Option<&Path>) -> ChainResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(Path::new(&path))?,
                None => Self::default(),
            },
        };

        if let Some(db) = std::env::var_os(DB_ENV) {
            config.store.path = db.into();
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> ChainResult<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ChainError::Config {
                reason: "store.path must not be empty".to_string(),
            });
        }
        if self.verify.page_size == 0 {
            return Err(ChainError::Config {
                reason: "verify.page_size must be at least 1".to_string(),
            });
        }
        if self.append.max_batch == 0 {
            return Err(ChainError::Config {
                reason: "append.max_batch must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
