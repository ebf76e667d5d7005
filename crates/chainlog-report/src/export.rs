//! Exports of query results and report tables.

use std::io::{self, Write};

use chainlog_contracts::Entry;

use crate::action::ActionLine;

/// Write `timestamp,action_type,detail` rows with RFC 4180 quoting.
pub fn write_csv<W: Write>(entries: &[Entry], out: W) -> io::Result<()> {
    write_table_csv(&["timestamp", "action_type", "detail"], &entry_rows(entries), out)
}

/// Write the full entries, hashes included, as a JSON array.
pub fn write_json<W: Write>(entries: &[Entry], mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, entries)?;
    writeln!(out)?;
    out.flush()
}

/// Write entries as a standalone HTML page with one table row each.
pub fn write_html<W: Write>(entries: &[Entry], title: &str, out: W) -> io::Result<()> {
    write_table_html(
        title,
        &["Timestamp", "Action Type", "Detail"],
        &entry_rows(entries),
        out,
    )
}

/// Write any table as CSV, header first.
pub fn write_table_csv<W: Write>(headers: &[&str], rows: &[Vec<String>], mut out: W) -> io::Result<()> {
    let header: Vec<String> = headers.iter().map(|h| csv_field(h)).collect();
    writeln!(out, "{}", header.join(","))?;
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| csv_field(c)).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    out.flush()
}

/// Write any table as a standalone HTML page.  Every cell is escaped.
pub fn write_table_html<W: Write>(
    title: &str,
    headers: &[&str],
    rows: &[Vec<String>],
    mut out: W,
) -> io::Result<()> {
    let title = html_escape(title);
    writeln!(out, "<!doctype html>")?;
    writeln!(
        out,
        "<html><head><meta charset=\"utf-8\"><title>{title}</title>"
    )?;
    writeln!(out, "<style>{HTML_STYLE}</style></head>")?;
    writeln!(out, "<body>\n<h2>{title}</h2>\n<table>")?;

    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    writeln!(out, "  <thead><tr>{head}</tr></thead>\n  <tbody>")?;
    for row in rows {
        let cells: String = row
            .iter()
            .map(|c| format!("<td>{}</td>", html_escape(c)))
            .collect();
        writeln!(out, "    <tr>{cells}</tr>")?;
    }
    writeln!(out, "  </tbody>\n</table>\n</body></html>")?;
    out.flush()
}

const HTML_STYLE: &str = "body{font-family:Segoe UI,Arial,sans-serif;padding:16px}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ddd;padding:8px}\
th{background:#f4f4f4;text-align:left}\
tr:nth-child(even){background:#fafafa}";

fn entry_rows(entries: &[Entry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|entry| {
            let line = ActionLine::parse(&entry.action);
            vec![entry.timestamp.clone(), line.kind, line.detail]
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
