use std::fmt;
use thiserror::Error;

/// Which of the two dashboard requests failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// GET that yields the session-state tokens.
    Bootstrap,
    /// Form POST that yields the alert markup.
    Submit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Bootstrap => f.write_str("Initial request failed"),
            Phase::Submit => f.write_str("Failed to make a second request"),
        }
    }
}

/// Failures of a single scrape. None of them are retried.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The transport could not complete the request.
    #[error("{phase}: could not reach server ({source})")]
    NetworkFailure {
        phase: Phase,
        #[source]
        source: ureq::Error,
    },

    /// The server answered with a non-success status.
    #[error("{phase}: {status} {reason}")]
    HttpFailure {
        phase: Phase,
        status: u16,
        reason: String,
    },

    /// An expected marker was missing from the markup.
    #[error("Unexpected dashboard markup: {what}")]
    ParseFailure { what: String },

    /// Alert text for an environment was not an integer.
    #[error("Alert count for {environment} is not a number: {text:?}")]
    NumericFailure { environment: String, text: String },

    /// Reading or writing the baseline file failed.
    #[error("Baseline file error: {0}")]
    Baseline(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn parse(what: impl Into<String>) -> Self {
        ScrapeError::ParseFailure { what: what.into() }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_failure_names_phase_and_status() {
        let err = ScrapeError::HttpFailure {
            phase: Phase::Submit,
            status: 401,
            reason: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "Failed to make a second request: 401 Unauthorized");
    }

    #[test]
    fn test_numeric_failure_quotes_text() {
        let err = ScrapeError::NumericFailure {
            environment: "EnvA".into(),
            text: "(n/a".into(),
        };
        assert_eq!(err.to_string(), "Alert count for EnvA is not a number: \"(n/a\"");
    }
}
