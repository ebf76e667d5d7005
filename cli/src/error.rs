//! Errors of the `chainlog` binary.
//!
//! Chain failures pass through unchanged; failures of the binary's own I/O
//! (stdin, export files, stdout) carry what was being read or written.

use std::io;

use thiserror::Error;

use chainlog_contracts::ChainError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| CliError::Io { context, source }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io {
            context: "failed to encode output".to_string(),
            source: e.into(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
