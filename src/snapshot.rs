use chrono::{DateTime, Local};
use std::fmt;

/// Count recorded for a row whose alert text could not be parsed.
pub const UNPARSED: i64 = -1;

pub const NAME_WIDTH: usize = 28;
pub const COLUMN_WIDTH: usize = 10;

const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

/// Change since the baseline, or `NA` when there is nothing to compare to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diff {
    NotAvailable,
    Delta(i64),
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diff::NotAvailable => f.write_str("NA"),
            Diff::Delta(d) => write!(f, "{}", d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRow {
    pub name: String,
    pub count: i64,
    pub diff: Diff,
}

impl EnvironmentRow {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
            diff: Diff::NotAvailable,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.count != UNPARSED
    }

    /// Fixed-width table line, as printed and as persisted.
    pub fn to_line(&self) -> String {
        format_line(&self.name, &self.count.to_string(), &self.diff.to_string())
    }
}

/// One scrape: capture time plus rows in configured order.
#[derive(Debug, Clone)]
pub struct ScrapeSnapshot {
    pub timestamp: DateTime<Local>,
    pub rows: Vec<EnvironmentRow>,
}

impl ScrapeSnapshot {
    pub fn new(timestamp: DateTime<Local>, rows: Vec<EnvironmentRow>) -> Self {
        Self { timestamp, rows }
    }

    pub fn stamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    /// Timestamp line, both header lines and one line per row.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 3);
        lines.push(self.stamp());
        lines.extend(header_lines());
        lines.extend(self.rows.iter().map(EnvironmentRow::to_line));
        lines
    }
}

pub fn format_line(name: &str, count: &str, diff: &str) -> String {
    format!(
        "|{:<nw$}|{:<cw$}|{:<cw$}|",
        name,
        count,
        diff,
        nw = NAME_WIDTH,
        cw = COLUMN_WIDTH
    )
}

/// Column titles followed by a blank spacer row.
pub fn header_lines() -> [String; 2] {
    [format_line("(Environment)", "State", "Diff"), format_line("", "", "")]
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
