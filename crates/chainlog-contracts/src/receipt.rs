//! Boundary shapes returned to producers.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// What a producer gets back from a single append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    pub timestamp: String,
    pub action: String,
    pub hash: String,
}

/// The result of a batch append: accepted entries in input order.
///
/// Blank items are skipped and never appear in `logged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub logged: Vec<Entry>,
    pub count: usize,
}

impl BatchOutcome {
    /// Convert to the wire shape `{logged: [...], count}`.
    pub fn receipt(&self) -> BatchReceipt {
        BatchReceipt {
            logged: self.logged.iter().map(Entry::receipt).collect(),
            count: self.count,
        }
    }
}

/// Wire shape of a batch append result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub logged: Vec<AppendReceipt>,
    pub count: usize,
}
