//! # chainlog-report
//!
//! Read-only reporting over the chainlog audit chain.
//!
//! Reports never write: they query a [`ChainStore`] with an [`EntryFilter`]
//! and turn the matching entries into grouped counts, tables, or CSV / JSON
//! / HTML exports.  Actions are read with the `"<kind>: <detail>"`
//! convention described in [`action`].
//!
//! Three reports are provided:
//! - [`summarize_store`]: entry counts by action kind or detail
//! - [`app_usage_from_store`]: focus sessions and time per application
//! - [`input_activity_from_store`]: keyboard and mouse activity per bucket

pub mod action;
pub mod app_usage;
pub mod export;
pub mod input_activity;
pub mod summary;
pub mod window;

use tracing::debug;

use chainlog_contracts::{ChainResult, Entry, EntryFilter};
use chainlog_core::ChainStore;

pub use action::ActionLine;
pub use app_usage::{
    humanize_secs, summarize_app_usage, write_sessions_csv, AppGroupBy, AppUsage, FocusSession,
};
pub use export::{write_csv, write_html, write_json, write_table_csv, write_table_html};
pub use input_activity::{summarize_input, write_events_csv, Bucket, InputActivity, InputCounts};
pub use summary::{render_table, summarize, GroupBy};
pub use window::{resolve_bound, resolve_upper_bound};

/// Grouped view of the entries matching a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of matching entries before grouping.
    pub total: usize,
    pub groups: Vec<(String, usize)>,
}

/// Query `store` and group the matches.
pub fn summarize_store(
    store: &dyn ChainStore,
    filter: &EntryFilter,
    by: GroupBy,
    top: usize,
) -> ChainResult<Summary> {
    let entries: Vec<Entry> = store.query(filter)?;
    debug!(matched = entries.len(), ?by, "summarizing entries");
    Ok(Summary {
        total: entries.len(),
        groups: summarize(&entries, by, top),
    })
}

/// Focus sessions matching a filter and their per-application totals.
#[derive(Debug, Clone, PartialEq)]
pub struct AppUsageReport {
    /// Every parsed session, in chain order.
    pub sessions: Vec<FocusSession>,
    pub apps: Vec<AppUsage>,
}

/// Query `store` for focus-end lines and aggregate them.
pub fn app_usage_from_store(
    store: &dyn ChainStore,
    filter: &EntryFilter,
    by: AppGroupBy,
    top: usize,
) -> ChainResult<AppUsageReport> {
    let filter = filter.clone().kind(app_usage::FOCUS_END_KIND);
    let sessions: Vec<FocusSession> = store
        .query(&filter)?
        .iter()
        .filter_map(FocusSession::from_entry)
        .collect();
    debug!(sessions = sessions.len(), ?by, "aggregating app usage");
    Ok(AppUsageReport {
        apps: summarize_app_usage(&sessions, by, top),
        sessions,
    })
}

/// Query `store` for input summary and events lines and bucket them.
pub fn input_activity_from_store(
    store: &dyn ChainStore,
    filter: &EntryFilter,
    bucket: Bucket,
) -> ChainResult<InputActivity> {
    let entries = store.query(&filter.clone().kind("Input "))?;
    debug!(matched = entries.len(), ?bucket, "bucketing input activity");
    Ok(summarize_input(&entries, bucket))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
