//! Chain verification results.
//!
//! `VerifyReport` is what the verifier produces.  `VerifyResponse` is the
//! flattened shape handed to external callers.

use serde::{Deserialize, Serialize};

/// Overall outcome of a chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyStatus {
    Ok,
    Tampered,
}

/// Why the first bad entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperKind {
    /// `prev_hash` does not equal the running hash of the chain.
    BrokenLink,
    /// `hash` does not equal the digest recomputed from the entry's fields.
    HashMismatch,
    /// The id does not follow its predecessor; an entry is missing.
    IdGap { expected: u64 },
    /// Rows are stored that no id in `1..=tail` accounts for, e.g. rows
    /// inserted out-of-band with an id below 1.
    StrayRows { count: u64 },
}

/// Result of verifying all or part of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub status: VerifyStatus,

    /// Id of the first inconsistent entry.  `None` when `status` is `Ok`,
    /// and for `StrayRows`, which no chain id identifies.
    pub tampered_id: Option<u64>,

    /// Set whenever `status` is `Tampered`.
    pub kind: Option<TamperKind>,

    /// Number of entries that passed before the scan ended.
    pub checked: u64,
}

impl VerifyReport {
    pub fn ok(checked: u64) -> Self {
        Self {
            status: VerifyStatus::Ok,
            tampered_id: None,
            kind: None,
            checked,
        }
    }

    pub fn tampered(id: u64, kind: TamperKind, checked: u64) -> Self {
        Self {
            status: VerifyStatus::Tampered,
            tampered_id: Some(id),
            kind: Some(kind),
            checked,
        }
    }

    /// Every chain entry checked out but `count` extra rows sit outside it.
    pub fn stray_rows(count: u64, checked: u64) -> Self {
        Self {
            status: VerifyStatus::Tampered,
            tampered_id: None,
            kind: Some(TamperKind::StrayRows { count }),
            checked,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == VerifyStatus::Ok
    }

    /// Human-readable summary of the report.
    pub fn message(&self) -> String {
        match (self.tampered_id, &self.kind) {
            (Some(id), Some(TamperKind::BrokenLink)) => {
                format!("Tampering detected at entry ID {id}: prev_hash does not link to the chain")
            }
            (Some(id), Some(TamperKind::HashMismatch)) => {
                format!("Tampering detected at entry ID {id}: stored hash does not match contents")
            }
            (Some(id), Some(TamperKind::IdGap { expected })) => {
                format!("Tampering detected at entry ID {id}: expected entry ID {expected}")
            }
            (_, Some(TamperKind::StrayRows { count })) => {
                format!("Tampering detected: {count} stored rows are outside the chain's id sequence")
            }
            (Some(id), None) => format!("Tampering detected at entry ID {id}"),
            (None, _) => format!("All {} logs are intact and verified.", self.checked),
        }
    }

    /// Flatten into the `{status, message, tamperedId?}` wire shape.
    pub fn to_response(&self) -> VerifyResponse {
        VerifyResponse {
            status: if self.is_ok() { "SUCCESS" } else { "FAILED" }.to_string(),
            message: self.message(),
            tampered_id: self.tampered_id,
        }
    }
}

/// Wire shape of a verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// `"SUCCESS"` or `"FAILED"`.
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tampered_id: Option<u64>,
}
