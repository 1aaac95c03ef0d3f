use crate::config::{HEADER_LINES, MAX_TABLE_LINES};
use crate::error::Result;
use crate::snapshot::ScrapeSnapshot;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name and count recovered from one stored table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub name: String,
    pub count: i64,
}

impl StoredRow {
    /// `None` for blank, short or otherwise unreadable lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut columns = line.split('|');
        columns.next()?; // text before the leading pipe
        let name = columns.next()?.trim();
        let count = columns.next()?.trim().parse().ok()?;
        Some(Self {
            name: name.to_string(),
            count,
        })
    }
}

/// Contents of the baseline file as last written by `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub timestamp: String,
    /// Every line after the timestamp, headers included, unparsed.
    pub lines: Vec<String>,
}

impl Baseline {
    /// Environment rows by position. Unreadable lines come back as `None`.
    pub fn rows(&self) -> Vec<Option<StoredRow>> {
        self.lines
            .iter()
            .skip(HEADER_LINES - 1)
            .map(|line| StoredRow::parse(line))
            .collect()
    }

    /// Timestamp and table with the diff column dropped. Blank lines are skipped.
    pub fn render_without_diff(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        out.push(self.timestamp.clone());
        out.extend(
            self.lines
                .iter()
                .filter(|line| !line.trim().is_empty())
                .map(|line| cut_after_pipe(line, 3).to_string()),
        );
        out
    }
}

/// Prefix of `line` up to and including its `n`th pipe, or the whole line.
fn cut_after_pipe(line: &str, n: usize) -> &str {
    match line.match_indices('|').nth(n - 1) {
        Some((idx, _)) => &line[..=idx],
        None => line,
    }
}

/// Single-slot snapshot file. Last write wins; there is no locking.
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot. A missing file is `Ok(None)`.
    pub fn read(&self) -> Result<Option<Baseline>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut lines = text.lines().map(|l| l.trim_end_matches('\r').to_string());
        let timestamp = lines.next().unwrap_or_default();
        let lines = lines.take(MAX_TABLE_LINES - 1).collect();
        Ok(Some(Baseline { timestamp, lines }))
    }

    /// Overwrite the file with `snapshot`.
    pub fn write(&self, snapshot: &ScrapeSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut out = BufWriter::new(File::create(&self.path)?);
        for line in snapshot.to_lines() {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }
}
