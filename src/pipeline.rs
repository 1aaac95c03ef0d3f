use crate::baseline::{Baseline, BaselineStore};
use crate::config::{Config, RowPolicy};
use crate::credentials::Credential;
use crate::diff;
use crate::error::{Phase, Result};
use crate::events::{EventSink, ShellEvent};
use crate::parser::{self, RowOutcome};
use crate::session::SessionClient;
use crate::snapshot::{EnvironmentRow, ScrapeSnapshot};
use chrono::Local;

/// A finished scrape and the baseline it was diffed against.
pub struct ScrapeResult {
    pub snapshot: ScrapeSnapshot,
    pub previous: Option<Baseline>,
}

/// Run one full scrape: bootstrap, tokens, submit, extract, diff.
///
/// Nothing is written here; persisting is up to the caller and only happens
/// once this has returned `Ok`.
pub fn scrape(
    config: &Config,
    credential: &Credential,
    store: &BaselineStore,
    sink: &dyn EventSink,
) -> Result<ScrapeResult> {
    sink.send(ShellEvent::Log(format!(
        "Scraping {} as {} for {} environments",
        config.dashboard_url,
        credential.username(),
        config.environments.len()
    )));
    let client = SessionClient::new(config.dashboard_url.as_str(), credential);

    let page = request(Phase::Bootstrap, sink, || client.bootstrap())?;
    let tokens = parser::extract_tokens(&page)?;
    sink.send(ShellEvent::TokensExtracted);

    let timestamp = Local::now();
    let page = request(Phase::Submit, sink, || client.submit(&tokens))?;

    let outcomes = parser::extract_alerts(&page, &config.environments, &config.regional_marker)?;
    let rows = apply_row_policy(outcomes, config.row_policy, sink)?;
    let mut snapshot = ScrapeSnapshot::new(timestamp, rows);

    // An unreadable file diffs like a missing one, so `set` can still replace it.
    let previous = store.read().unwrap_or_else(|e| {
        sink.send(ShellEvent::BaselineUnreadable { reason: e.to_string() });
        None
    });
    match &previous {
        Some(baseline) => {
            sink.send(ShellEvent::BaselineLoaded {
                rows: baseline.rows().iter().flatten().count(),
            });
            diff::apply(&mut snapshot, baseline, config.alignment);
        }
        None => sink.send(ShellEvent::BaselineMissing),
    }

    Ok(ScrapeResult { snapshot, previous })
}

/// Scrape and store the result as the new baseline.
pub fn scrape_and_store(
    config: &Config,
    credential: &Credential,
    store: &BaselineStore,
    sink: &dyn EventSink,
) -> Result<ScrapeResult> {
    let result = scrape(config, credential, store, sink)?;
    store.write(&result.snapshot)?;
    sink.send(ShellEvent::BaselineWritten {
        path: store.path().to_path_buf(),
    });
    Ok(result)
}

fn request(
    phase: Phase,
    sink: &dyn EventSink,
    send: impl FnOnce() -> Result<String>,
) -> Result<String> {
    sink.send(ShellEvent::RequestStarted { phase });
    match send() {
        Ok(body) => {
            sink.send(ShellEvent::RequestComplete { phase, body_bytes: body.len() });
            Ok(body)
        }
        Err(e) => {
            sink.send(ShellEvent::RequestFailed { phase });
            Err(e)
        }
    }
}

fn apply_row_policy(
    outcomes: Vec<RowOutcome>,
    policy: RowPolicy,
    sink: &dyn EventSink,
) -> Result<Vec<EnvironmentRow>> {
    let total = outcomes.len();
    let rows = match policy {
        RowPolicy::Strict => outcomes
            .into_iter()
            .map(RowOutcome::into_strict)
            .collect::<Result<Vec<_>>>()?,
        RowPolicy::PerRow => outcomes
            .into_iter()
            .map(|outcome| {
                if let RowOutcome::Unparsed { name, text } = &outcome {
                    sink.send(ShellEvent::RowUnparsed {
                        environment: name.clone(),
                        text: text.clone(),
                    });
                }
                outcome.into_row()
            })
            .collect(),
    };
    let unparsed = rows.iter().filter(|r| !r.is_parsed()).count();
    sink.send(ShellEvent::RowsExtracted { rows: total, unparsed });
    Ok(rows)
}
