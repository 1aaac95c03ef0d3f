use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Lines a baseline file can hold, header lines included.
pub const MAX_TABLE_LINES: usize = 24;
/// Header lines preceding the environment rows (timestamp + two table headers).
pub const HEADER_LINES: usize = 3;
/// Most environments a single snapshot can carry.
pub const MAX_ENVIRONMENTS: usize = MAX_TABLE_LINES - HEADER_LINES;

pub const BASELINE_FILE_NAME: &str = "DashboardBaseline.txt";

/// How new rows are matched against stored baseline rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Match stored rows by environment name.
    ByName,
    /// Match stored rows by position only.
    Ordinal,
}

/// What happens when one environment's alert text is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Abort the whole scrape on the first bad row.
    Strict,
    /// Keep going and mark the row with the -1 sentinel.
    PerRow,
}

/// Runtime configuration for the dashboard scraper.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page hit by both the bootstrap GET and the postback POST.
    pub dashboard_url: String,
    /// Single-slot baseline file.
    pub baseline_path: PathBuf,
    /// Environments as labelled on the dashboard, in display order.
    pub environments: Vec<String>,
    /// Appended to usernames that do not already carry it.
    pub domain_suffix: String,
    /// Parenthesized region tag that precedes the alert group for some rows.
    pub regional_marker: String,
    pub alignment: Alignment,
    pub row_policy: RowPolicy,
    /// Print pipeline log lines to stderr.
    pub verbose: bool,
}

impl Config {
    /// Built-in configuration for the server state dashboard.
    pub fn default_dashboard() -> Self {
        Self {
            dashboard_url: "https://example.com/Dashboard_serverState/serverstate.aspx".into(),
            baseline_path: default_baseline_path(),
            environments: [
                "Production US",
                "Production EU",
                "Production Azure Singapore",
                "Staging US",
                "Staging EU",
                "QA",
                "Development",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            domain_suffix: "@example.com".into(),
            regional_marker: "SG".into(),
            alignment: Alignment::ByName,
            row_policy: RowPolicy::Strict,
            verbose: false,
        }
    }

    /// Defaults with `DASHBOARD_*` environment variable overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default_dashboard().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Split out so tests need not touch the process env.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("DASHBOARD_URL") {
            self.dashboard_url = url.trim().to_string();
        }
        if let Some(list) = lookup("DASHBOARD_ENVIRONMENTS") {
            self.environments = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("DASHBOARD_BASELINE") {
            self.baseline_path = PathBuf::from(path.trim());
        }
        if let Some(value) = lookup("DASHBOARD_ALIGNMENT") {
            self.alignment = parse_alignment(&value)?;
        }
        if let Some(value) = lookup("DASHBOARD_ROW_POLICY") {
            self.row_policy = parse_row_policy(&value)?;
        }
        if let Some(value) = lookup("DASHBOARD_VERBOSE") {
            self.verbose = matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dashboard_url.is_empty() {
            anyhow::bail!("Dashboard URL must not be empty");
        }
        if self.environments.is_empty() {
            anyhow::bail!("At least one environment must be configured");
        }
        if self.environments.len() > MAX_ENVIRONMENTS {
            anyhow::bail!(
                "{} environments configured, the baseline holds at most {}",
                self.environments.len(),
                MAX_ENVIRONMENTS
            );
        }
        Ok(())
    }
}

/// `DashboardBaseline.txt` next to the running executable, or in the
/// working directory if the executable path cannot be resolved.
fn default_baseline_path() -> PathBuf {
    exe_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(BASELINE_FILE_NAME)
}

fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate running executable")?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
}

fn parse_alignment(value: &str) -> Result<Alignment> {
    match value.trim().to_lowercase().as_str() {
        "name" | "by-name" => Ok(Alignment::ByName),
        "ordinal" | "position" => Ok(Alignment::Ordinal),
        other => anyhow::bail!(
            "Unknown DASHBOARD_ALIGNMENT '{}' (expected name or ordinal)",
            other
        ),
    }
}

fn parse_row_policy(value: &str) -> Result<RowPolicy> {
    match value.trim().to_lowercase().as_str() {
        "strict" => Ok(RowPolicy::Strict),
        "per-row" | "perrow" => Ok(RowPolicy::PerRow),
        other => anyhow::bail!(
            "Unknown DASHBOARD_ROW_POLICY '{}' (expected strict or per-row)",
            other
        ),
    }
}
