//! Keyboard and mouse activity over time.
//!
//! Input loggers flush a window of activity as two actions:
//!
//! ```text
//! Input summary: keys=12 | clicks=3 | scrolls=0 | moves=40 | interval=60.00s
//! Input events: {"window":{"start":"2025-08-09T12:00:00.000","seconds":60.0},"counts":{...},"events":[...]}
//! ```
//!
//! Both are folded into per-minute, per-hour or per-day buckets.  A
//! summary line is bucketed by its entry timestamp, an events payload by its
//! window start when that parses.  Lines that do not parse are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::Deserialize;
use serde_json::{Map, Value};

use chainlog_contracts::Entry;

use crate::action::ActionLine;
use crate::export::write_table_csv;

pub const INPUT_SUMMARY_KIND: &str = "Input summary";
pub const INPUT_EVENTS_KIND: &str = "Input events";

/// Bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Minute,
    Hour,
    Day,
}

impl Bucket {
    fn start_of(self, ts: NaiveDateTime) -> NaiveDateTime {
        let ts = ts.with_nanosecond(0).unwrap_or(ts);
        let ts = ts.with_second(0).unwrap_or(ts);
        match self {
            Bucket::Minute => ts,
            Bucket::Hour => ts.with_minute(0).unwrap_or(ts),
            Bucket::Day => ts.date().and_hms_opt(0, 0, 0).unwrap_or(ts),
        }
    }
}

/// Activity counters of one bucket.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputCounts {
    pub keys: u64,
    pub clicks: u64,
    pub scrolls: u64,
    pub moves: u64,
    /// Seconds of logging that contributed; not part of `total`.
    #[serde(skip)]
    pub interval_secs: f64,
}

impl InputCounts {
    pub fn total(&self) -> u64 {
        self.keys + self.clicks + self.scrolls + self.moves
    }

    fn add(&mut self, other: &InputCounts) {
        self.keys += other.keys;
        self.clicks += other.clicks;
        self.scrolls += other.scrolls;
        self.moves += other.moves;
        self.interval_secs += other.interval_secs;
    }
}

/// Bucketed activity plus the individual events of every payload, in
/// chain order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputActivity {
    /// Bucket start (`YYYY-MM-DD HH:MM:SS`) to counters, ascending.
    pub buckets: BTreeMap<String, InputCounts>,
    pub events: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
struct EventsPayload {
    #[serde(default)]
    window: EventsWindow,
    #[serde(default)]
    counts: InputCounts,
    #[serde(default)]
    events: Vec<Map<String, Value>>,
}

#[derive(Default, Deserialize)]
struct EventsWindow {
    start: Option<String>,
    #[serde(default)]
    seconds: f64,
}

/// Fold every input summary and events line of `entries` into buckets.
pub fn summarize_input(entries: &[Entry], bucket: Bucket) -> InputActivity {
    let mut activity = InputActivity::default();
    for entry in entries {
        let line = ActionLine::parse(&entry.action);
        let Some(stamped) = parse_timestamp(&entry.timestamp) else {
            continue;
        };

        let (at, counts) = match line.kind.as_str() {
            INPUT_SUMMARY_KIND => match parse_summary(&line.detail) {
                Some(counts) => (stamped, counts),
                None => continue,
            },
            INPUT_EVENTS_KIND => {
                let Ok(payload) = serde_json::from_str::<EventsPayload>(&line.detail) else {
                    continue;
                };
                let at = payload
                    .window
                    .start
                    .as_deref()
                    .and_then(parse_timestamp)
                    .unwrap_or(stamped);
                for mut event in payload.events {
                    event
                        .entry("t")
                        .or_insert_with(|| Value::String(entry.timestamp.clone()));
                    event
                        .entry("e")
                        .or_insert_with(|| Value::String("key".to_string()));
                    activity.events.push(event);
                }
                let counts = InputCounts {
                    interval_secs: payload.window.seconds,
                    ..payload.counts
                };
                (at, counts)
            }
            _ => continue,
        };

        let key = bucket.start_of(at).format("%Y-%m-%d %H:%M:%S").to_string();
        activity.buckets.entry(key).or_default().add(&counts);
    }
    activity
}

/// `keys=12 | clicks=3 | scrolls=0 | moves=40 | interval=60.00s`; missing
/// counters are zero.
fn parse_summary(detail: &str) -> Option<InputCounts> {
    let mut counts = InputCounts::default();
    for part in detail.split('|') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let value: f64 = value.trim().trim_end_matches('s').parse().ok()?;
        match key.trim() {
            "keys" => counts.keys = value as u64,
            "clicks" => counts.clicks = value as u64,
            "scrolls" => counts.scrolls = value as u64,
            "moves" => counts.moves = value as u64,
            "interval" => counts.interval_secs = value,
            _ => {}
        }
    }
    Some(counts)
}

/// Stored RFC 3339 timestamps and the naive ISO stamps producers write.
fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

impl InputActivity {
    /// Table rows `[bucket, keys, clicks, scrolls, moves, interval]`, in
    /// bucket order, or the `top` most active buckets when `top > 0`.
    pub fn rows(&self, top: usize) -> Vec<Vec<String>> {
        let mut buckets: Vec<(&String, &InputCounts)> = self.buckets.iter().collect();
        if top > 0 {
            buckets.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then_with(|| a.0.cmp(b.0)));
            buckets.truncate(top);
        }
        buckets
            .into_iter()
            .map(|(start, c)| {
                vec![
                    start.clone(),
                    c.keys.to_string(),
                    c.clicks.to_string(),
                    c.scrolls.to_string(),
                    c.moves.to_string(),
                    format!("{:.2}", c.interval_secs),
                ]
            })
            .collect()
    }
}

pub const INPUT_HEADERS: [&str; 6] = ["Bucket Start", "Keys", "Clicks", "Scrolls", "Moves", "Interval(s)"];

/// Write flattened events, one column per key seen in any event.
pub fn write_events_csv<W: Write>(events: &[Map<String, Value>], out: W) -> io::Result<()> {
    let columns: BTreeSet<&str> = events
        .iter()
        .flat_map(|event| event.keys().map(String::as_str))
        .collect();
    let headers: Vec<&str> = columns.into_iter().collect();

    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|event| {
            headers
                .iter()
                .map(|key| match event.get(*key) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();
    write_table_csv(&headers, &rows, out)
}
