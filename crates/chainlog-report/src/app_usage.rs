//! Per-application focus time.
//!
//! Focus trackers close every foreground session with one action:
//!
//! ```text
//! App focus end: pid=42 | exe="Code.exe" | title="main.rs" | path="C:/.../Code.exe" | duration=12.50s | reason=focus_switch
//! ```
//!
//! `FocusSession` is the typed form of that line.  Lines of this kind
//! without a readable duration are skipped; other fields default to empty.

use std::collections::HashMap;
use std::io::{self, Write};

use chainlog_contracts::Entry;

use crate::action::ActionLine;
use crate::export::write_table_csv;

/// Action kind that closes a focus session.
pub const FOCUS_END_KIND: &str = "App focus end";

/// One closed foreground session.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSession {
    pub timestamp: String,
    /// Executable name, lowercased.
    pub exe: String,
    pub title: String,
    pub path: String,
    pub duration_secs: f64,
}

impl FocusSession {
    /// Read a session from an entry, if it is a focus-end line with a
    /// duration.
    pub fn from_entry(entry: &Entry) -> Option<Self> {
        let line = ActionLine::parse(&entry.action);
        if line.kind != FOCUS_END_KIND {
            return None;
        }
        let duration_secs = bare_field(&line.detail, "duration")?
            .trim_end_matches('s')
            .parse::<f64>()
            .ok()?;

        Some(Self {
            timestamp: entry.timestamp.clone(),
            exe: quoted_field(&line.detail, "exe")
                .unwrap_or_default()
                .to_lowercase(),
            title: quoted_field(&line.detail, "title").unwrap_or_default().to_string(),
            path: quoted_field(&line.detail, "path").unwrap_or_default().to_string(),
            duration_secs,
        })
    }
}

/// `key="value"` anywhere in `detail`.
fn quoted_field<'a>(detail: &'a str, key: &str) -> Option<&'a str> {
    let start = detail.find(&format!("{key}=\""))? + key.len() + 2;
    let len = detail[start..].find('"')?;
    Some(&detail[start..start + len])
}

/// `key=value` as one ` | `-separated part of `detail`.
fn bare_field<'a>(detail: &'a str, key: &str) -> Option<&'a str> {
    detail
        .split('|')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.trim())
}

/// What to aggregate sessions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppGroupBy {
    Exe,
    ExeAndTitle,
}

/// Aggregated focus time of one application (or application window).
#[derive(Debug, Clone, PartialEq)]
pub struct AppUsage {
    pub exe: String,
    /// Set when grouping by executable and title.
    pub title: Option<String>,
    pub sessions: usize,
    pub total_secs: f64,
    pub first_seen: String,
    pub last_seen: String,
}

/// Aggregate focus sessions, most total time first, keeping the `top`
/// largest groups.
pub fn summarize_app_usage(sessions: &[FocusSession], by: AppGroupBy, top: usize) -> Vec<AppUsage> {
    let mut groups: HashMap<(String, Option<String>), AppUsage> = HashMap::new();
    for session in sessions {
        let title = match by {
            AppGroupBy::Exe => None,
            AppGroupBy::ExeAndTitle => Some(session.title.clone()),
        };
        let usage = groups
            .entry((session.exe.clone(), title.clone()))
            .or_insert_with(|| AppUsage {
                exe: session.exe.clone(),
                title,
                sessions: 0,
                total_secs: 0.0,
                first_seen: session.timestamp.clone(),
                last_seen: session.timestamp.clone(),
            });
        usage.sessions += 1;
        usage.total_secs += session.duration_secs;
        if session.timestamp < usage.first_seen {
            usage.first_seen = session.timestamp.clone();
        }
        if session.timestamp > usage.last_seen {
            usage.last_seen = session.timestamp.clone();
        }
    }

    let mut ranked: Vec<AppUsage> = groups.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_secs
            .total_cmp(&a.total_secs)
            .then_with(|| a.exe.cmp(&b.exe))
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked.truncate(top);
    ranked
}

/// `1h 2m 3s`, `2m 3s` or `3s`, rounded to whole seconds.
pub fn humanize_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Write one CSV row per session: `timestamp,exe,title,path,duration_s`.
pub fn write_sessions_csv<W: Write>(sessions: &[FocusSession], out: W) -> io::Result<()> {
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.timestamp.clone(),
                s.exe.clone(),
                s.title.clone(),
                s.path.clone(),
                format!("{:.2}", s.duration_secs),
            ]
        })
        .collect();
    write_table_csv(&["timestamp", "exe", "title", "path", "duration_s"], &rows, out)
}
