//! Grouped counts over a set of entries.

use std::collections::HashMap;

use chainlog_contracts::Entry;

use crate::action::ActionLine;

/// What to group entries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// The part before the first `:`.
    Kind,
    /// The part after it, falling back to the kind when there is none.
    Detail,
}

/// The `top` most frequent keys, most frequent first, ties by key.
pub fn summarize(entries: &[Entry], by: GroupBy, top: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let line = ActionLine::parse(&entry.action);
        let key = match by {
            GroupBy::Kind => line.kind,
            GroupBy::Detail if line.detail.is_empty() => line.kind,
            GroupBy::Detail => line.detail,
        };
        *counts.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top);
    ranked
}

/// Render rows as a fixed-width ASCII table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = format!(
        "+-{}-+\n",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(&line(headers.to_vec()));
    out.push_str(&rule);
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out.push_str(&rule);
    out
}
