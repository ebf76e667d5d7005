//! Producer action payloads.
//!
//! The chain stores `action` as opaque text.  Producers and reports agree on
//! one convention: `"<kind>: <detail>"`, e.g. `"File created: C:/a.txt"`.
//! `ActionLine` is the typed form of that convention, so producers build the
//! text from fields instead of formatting it by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLine {
    pub kind: String,
    pub detail: String,
}

impl ActionLine {
    pub fn new(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: detail.into(),
        }
    }

    /// Split on the first `:`.  Text without one is all kind, no detail.
    pub fn parse(action: &str) -> Self {
        match action.split_once(':') {
            Some((kind, detail)) => Self::new(kind.trim(), detail.trim()),
            None => Self::new(action.trim(), ""),
        }
    }
}

impl fmt::Display for ActionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}
