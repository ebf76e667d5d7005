//! # chainlog-contracts
//!
//! Shared types, boundary shapes, and errors for the chainlog audit chain.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod entry;
pub mod error;
pub mod query;
pub mod receipt;
pub mod verify;

pub use entry::{Entry, NewEntry, GENESIS_HASH};
pub use error::{ChainError, ChainResult};
pub use query::EntryFilter;
pub use receipt::{AppendReceipt, BatchOutcome, BatchReceipt};
pub use verify::{TamperKind, VerifyReport, VerifyResponse, VerifyStatus};

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, action: &str) -> Entry {
        Entry {
            id,
            timestamp: "2025-08-09T12:00:00.000000Z".to_string(),
            action: action.to_string(),
            prev_hash: GENESIS_HASH.to_string(),
            hash: "ab".repeat(32),
        }
    }

    // ── Entry ────────────────────────────────────────────────────────────────

    #[test]
    fn genesis_hash_is_64_zero_hex_chars() {
        assert_eq!(GENESIS_HASH.len(), 64);
        assert!(GENESIS_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn new_entry_into_entry_keeps_fields() {
        let new = NewEntry {
            timestamp: "2025-08-09T12:00:00.000001Z".to_string(),
            action: "File created: a.txt".to_string(),
            hash: "cd".repeat(32),
        };
        let e = new.into_entry(7, "ef".repeat(32));

        assert_eq!(e.id, 7);
        assert_eq!(e.action, "File created: a.txt");
        assert_eq!(e.prev_hash, "ef".repeat(32));
        assert_eq!(e.hash, "cd".repeat(32));
    }

    #[test]
    fn receipt_drops_id_and_prev_hash() {
        let receipt = entry(3, "login").receipt();
        let json = serde_json::to_value(&receipt).unwrap();

        assert_eq!(json["action"], "login");
        assert!(json.get("id").is_none());
        assert!(json.get("prev_hash").is_none());
    }

    #[test]
    fn batch_receipt_carries_count() {
        let outcome = BatchOutcome {
            logged: vec![entry(1, "a"), entry(2, "b")],
            count: 2,
        };
        let receipt = outcome.receipt();
        assert_eq!(receipt.count, 2);
        assert_eq!(receipt.logged[1].action, "b");
    }

    // ── VerifyReport ─────────────────────────────────────────────────────────

    #[test]
    fn ok_report_maps_to_success_without_tampered_id() {
        let response = VerifyReport::ok(5).to_response();
        assert_eq!(response.status, "SUCCESS");
        assert!(response.tampered_id.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("tamperedId").is_none());
    }

    #[test]
    fn tampered_report_maps_to_failed_with_id() {
        let report = VerifyReport::tampered(4, TamperKind::HashMismatch, 3);
        assert!(!report.is_ok());

        let response = report.to_response();
        assert_eq!(response.status, "FAILED");
        assert_eq!(response.tampered_id, Some(4));
        assert!(response.message.contains("entry ID 4"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["tamperedId"], 4);
    }

    #[test]
    fn id_gap_message_names_expected_id() {
        let report = VerifyReport::tampered(9, TamperKind::IdGap { expected: 8 }, 7);
        assert!(report.message().contains("expected entry ID 8"));
    }

    #[test]
    fn stray_rows_report_is_tampered_without_an_id() {
        let report = VerifyReport::stray_rows(2, 5);
        assert!(!report.is_ok());
        assert_eq!(report.kind, Some(TamperKind::StrayRows { count: 2 }));

        let response = report.to_response();
        assert_eq!(response.status, "FAILED");
        assert!(response.tampered_id.is_none());
        assert!(response.message.contains("2 stored rows"));
    }

    // ── EntryFilter ──────────────────────────────────────────────────────────

    #[test]
    fn filter_bounds_are_inclusive() {
        let f = EntryFilter::default()
            .since("2025-08-09T00:00:00")
            .until("2025-08-09T23:59:59.999999Z");

        assert!(f.matches("2025-08-09T00:00:00.000000Z", "x"));
        assert!(f.matches("2025-08-09T23:59:59.999999Z", "x"));
        assert!(!f.matches("2025-08-08T23:59:59.999999Z", "x"));
        assert!(!f.matches("2025-08-10T00:00:00.000000Z", "x"));
    }

    #[test]
    fn filter_contains_is_case_insensitive() {
        let f = EntryFilter::default().contains("downloads");
        assert!(f.matches("t", "File created: C:/Users/a/Downloads/x.zip"));
        assert!(!f.matches("t", "App focus: notepad.exe"));
    }

    #[test]
    fn filter_kind_looks_before_the_first_colon() {
        let f = EntryFilter::default().kind("file CREATED");
        assert!(f.matches("t", "File created: C:/a.txt"));
        assert!(!f.matches("t", "File deleted: C:/file created.txt"));
        assert!(EntryFilter::default().kind("locked").matches("t", "Screen locked"));
    }

    #[test]
    fn filter_contains_folds_ascii_only() {
        let action = "File created: C:/Users/RENÉ/CAFÉ.txt";
        assert!(EntryFilter::default().contains("CAFÉ").matches("t", action));
        assert!(EntryFilter::default().contains("café").matches("t", "x/café.txt"));
        assert!(!EntryFilter::default().contains("café").matches("t", action));
    }

    // ── ChainError display messages ──────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = ChainError::Validation {
            reason: "action must not be blank".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("validation failed"));
        assert!(msg.contains("must not be blank"));
    }

    #[test]
    fn error_retry_exhausted_display() {
        let err = ChainError::RetryExhausted { attempts: 4 };
        assert!(err.to_string().contains("4 conflicting attempts"));
    }

    #[test]
    fn error_batch_aborted_display() {
        let err = ChainError::BatchAborted {
            committed: 2,
            reason: "disk I/O error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2 committed"));
        assert!(msg.contains("disk I/O error"));
    }

    #[test]
    fn error_storage_helper_wraps_display() {
        let err = ChainError::storage("database is locked");
        assert!(matches!(err, ChainError::Storage { ref reason } if reason == "database is locked"));
    }
}
