use crate::error::Phase;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

// ── Events from the scrape pipeline ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    Log(String),

    RequestStarted { phase: Phase },
    RequestComplete { phase: Phase, body_bytes: usize },
    RequestFailed { phase: Phase },

    TokensExtracted,
    RowsExtracted { rows: usize, unparsed: usize },
    /// Alert text that did not parse, kept as a -1 row.
    RowUnparsed { environment: String, text: String },

    BaselineLoaded { rows: usize },
    BaselineMissing,
    /// Baseline present but unreadable; diffed as if missing.
    BaselineUnreadable { reason: String },
    BaselineWritten { path: PathBuf },
}

// ── EventSink trait ─────────────────────────────────────────────────────────

/// Abstraction for reporting scrape progress.
pub trait EventSink {
    fn send(&self, event: ShellEvent);
}

// ── Console sink ────────────────────────────────────────────────────────────

/// Spinner while a request is in flight; log lines only when verbose.
pub struct ConsoleSink {
    verbose: bool,
    pb: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            pb: Mutex::new(None),
        }
    }

    fn make_spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn clear_spinner(&self) {
        if let Ok(mut guard) = self.pb.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn log(&self, msg: impl AsRef<str>) {
        if self.verbose {
            eprintln!("  {}", msg.as_ref());
        }
    }
}

impl EventSink for ConsoleSink {
    fn send(&self, event: ShellEvent) {
        match event {
            ShellEvent::Log(msg) => self.log(msg),

            ShellEvent::RequestStarted { phase } => {
                let message = match phase {
                    Phase::Bootstrap => "Requesting dashboard...",
                    Phase::Submit => "Posting back for alert data...",
                };
                if let Ok(mut guard) = self.pb.lock() {
                    *guard = Some(Self::make_spinner(message.to_string()));
                }
            }
            ShellEvent::RequestComplete { phase, body_bytes } => {
                self.clear_spinner();
                self.log(format!("{:?} response: {} bytes", phase, body_bytes));
            }
            ShellEvent::RequestFailed { .. } => self.clear_spinner(),

            ShellEvent::TokensExtracted => self.log("Session-state tokens extracted"),
            ShellEvent::RowsExtracted { rows, unparsed } => {
                self.log(format!("{} environments scraped, {} unparsed", rows, unparsed));
            }
            // Always shown: the row silently reads -1 otherwise.
            ShellEvent::RowUnparsed { environment, text } => {
                eprintln!(
                    "  WARNING: could not read alert count for {}: {:?}",
                    environment, text
                );
            }

            ShellEvent::BaselineLoaded { rows } => self.log(format!("Baseline has {} rows", rows)),
            ShellEvent::BaselineMissing => self.log("No baseline to diff against"),
            ShellEvent::BaselineUnreadable { reason } => {
                eprintln!("  WARNING: ignoring unreadable baseline: {}", reason);
            }
            ShellEvent::BaselineWritten { path } => {
                self.log(format!("Baseline written to {}", path.display()));
            }
        }
    }
}

// ── Recording sink (tests) ──────────────────────────────────────────────────

#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ShellEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn take(&self) -> Vec<ShellEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn send(&self, event: ShellEvent) {
        self.events.lock().unwrap().push(event);
    }
}
