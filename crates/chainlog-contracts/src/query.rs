//! Read-only query filter for reporting tools.

use serde::{Deserialize, Serialize};

/// Filter over persisted entries.  All set fields must match.
///
/// Timestamp bounds are inclusive and compared lexically, which equals
/// chronological order for the fixed-width timestamps the appender writes.
/// Results are always returned in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    pub since: Option<String>,
    pub until: Option<String>,
    /// Substring of `action`, ignoring ASCII case.  Non-ASCII letters must
    /// match exactly, which is what SQLite's `lower()` does too.
    pub contains: Option<String>,
    /// Substring of the action kind, the text before the first `:` (or the
    /// whole action when it has none).  Same case rule as `contains`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

impl EntryFilter {
    pub fn since(mut self, ts: impl Into<String>) -> Self {
        self.since = Some(ts.into());
        self
    }

    pub fn until(mut self, ts: impl Into<String>) -> Self {
        self.until = Some(ts.into());
        self
    }

    pub fn contains(mut self, text: impl Into<String>) -> Self {
        self.contains = Some(text.into());
        self
    }

    pub fn kind(mut self, text: impl Into<String>) -> Self {
        self.kind = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the timestamp and text predicates against one entry.
    ///
    /// `limit` is applied by the caller.
    pub fn matches(&self, timestamp: &str, action: &str) -> bool {
        if let Some(since) = &self.since {
            if timestamp < since.as_str() {
                return false;
            }
        }
        if let Some(until) = &self.until {
            if timestamp > until.as_str() {
                return false;
            }
        }
        if let Some(needle) = &self.kind {
            let kind = action.split_once(':').map_or(action, |(kind, _)| kind);
            if !contains_ascii_folded(kind, needle) {
                return false;
            }
        }
        match &self.contains {
            Some(needle) => contains_ascii_folded(action, needle),
            None => true,
        }
    }
}

fn contains_ascii_folded(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
