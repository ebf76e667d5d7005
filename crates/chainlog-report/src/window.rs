//! Time window bounds for queries.
//!
//! Accepts the relative words `today` and `yesterday` (UTC midnight) or any
//! timestamp prefix such as `2025-08-09` or `2025-08-09T13:00:00`, which
//! compares lexically against stored timestamps.

use chrono::{DateTime, Duration, Utc};

use chainlog_contracts::{ChainError, ChainResult};

/// Turn a user-supplied bound into a comparable timestamp string.
pub fn resolve_bound(input: &str, now: DateTime<Utc>) -> ChainResult<String> {
    let trimmed = input.trim();
    let midnight = |days_back: i64| {
        (now.date_naive() - Duration::days(days_back))
            .format("%Y-%m-%dT00:00:00.000000Z")
            .to_string()
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "today" => Ok(midnight(0)),
        "yesterday" => Ok(midnight(1)),
        "" => Err(ChainError::Validation {
            reason: "time bound must not be empty".to_string(),
        }),
        _ if looks_like_timestamp(trimmed) => Ok(trimmed.to_string()),
        _ => Err(ChainError::Validation {
            reason: format!("unrecognised time bound '{}'", trimmed),
        }),
    }
}

/// Stored timestamp layout, filled with the latest value of each field past
/// the date.  Truncated upper bounds take their missing tail from here.
const UPPER_BOUND_TEMPLATE: &str = "9999-99-99T23:59:59.999999Z";

/// An upper bound covers the whole unit it is truncated to.
///
/// `2025-08-09` ends at `2025-08-09T23:59:59.999999Z` and
/// `2025-08-09T13:00:00` at `2025-08-09T13:00:00.999999Z`, so entries
/// stamped within the last given unit are included.  Bounds that are not a
/// prefix of the stored layout (e.g. with an offset) are used as given.
pub fn resolve_upper_bound(input: &str, now: DateTime<Utc>) -> ChainResult<String> {
    let bound = resolve_bound(input, now)?;
    if is_stored_layout_prefix(&bound) {
        Ok(format!("{bound}{}", &UPPER_BOUND_TEMPLATE[bound.len()..]))
    } else {
        Ok(bound)
    }
}

/// `bound` is a strict prefix of `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
fn is_stored_layout_prefix(bound: &str) -> bool {
    bound.len() < UPPER_BOUND_TEMPLATE.len()
        && bound
            .bytes()
            .zip(UPPER_BOUND_TEMPLATE.bytes())
            .all(|(b, t)| if t.is_ascii_digit() { b.is_ascii_digit() } else { b == t })
}

/// `YYYY-MM-DD` followed by anything.
fn looks_like_timestamp(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}
