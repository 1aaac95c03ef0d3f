use crate::error::{Result, ScrapeError};
use crate::snapshot::{EnvironmentRow, UNPARSED};

const VIEWSTATE_MARKER: &str = "id=\"__VIEWSTATE\" value=\"";
const VIEWSTATE_LEN: usize = 76;
const GENERATOR_MARKER: &str = "id=\"__VIEWSTATEGENERATOR\" value=\"";
const GENERATOR_LEN: usize = 8;

/// Hidden postback fields echoed back by the second request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub view_state: String,
    pub generator: String,
}

/// Pull both session-state tokens out of the bootstrap page.
pub fn extract_tokens(body: &str) -> Result<SessionTokens> {
    Ok(SessionTokens {
        view_state: token_after(body, VIEWSTATE_MARKER, VIEWSTATE_LEN)?,
        generator: token_after(body, GENERATOR_MARKER, GENERATOR_LEN)?,
    })
}

/// Fixed-length slice immediately following `marker`.
fn token_after(body: &str, marker: &str, len: usize) -> Result<String> {
    let start = body
        .find(marker)
        .ok_or_else(|| ScrapeError::parse(format!("missing {}", marker.trim_end_matches('"'))))?
        + marker.len();
    body.get(start..start + len)
        .map(String::from)
        .ok_or_else(|| {
            ScrapeError::parse(format!(
                "token after {} is shorter than {} characters",
                marker.trim_end_matches('"'),
                len
            ))
        })
}

/// Outcome for one environment before the row policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Parsed(EnvironmentRow),
    /// Alert text found but not an integer.
    Unparsed { name: String, text: String },
}

impl RowOutcome {
    /// Row to report, with the sentinel count for failures.
    pub fn into_row(self) -> EnvironmentRow {
        match self {
            RowOutcome::Parsed(row) => row,
            RowOutcome::Unparsed { name, .. } => EnvironmentRow::new(name, UNPARSED),
        }
    }

    /// Turn a failure into the strict-mode error.
    pub fn into_strict(self) -> Result<EnvironmentRow> {
        match self {
            RowOutcome::Parsed(row) => Ok(row),
            RowOutcome::Unparsed { name, text } => Err(ScrapeError::NumericFailure {
                environment: name,
                text,
            }),
        }
    }
}

/// Scan the alert markup for each environment in order.
///
/// The search is monotonic: each name is looked up after the previous match,
/// so earlier content is never matched twice. A missing name or parenthesis is
/// a structural fault and aborts the scan; non-numeric alert text is recorded
/// per row and left to the caller.
pub fn extract_alerts(
    body: &str,
    environments: &[String],
    regional_marker: &str,
) -> Result<Vec<RowOutcome>> {
    let mut cursor = 0;
    let mut outcomes = Vec::with_capacity(environments.len());

    for name in environments {
        let found = body[cursor..]
            .find(name.as_str())
            .ok_or_else(|| ScrapeError::parse(format!("environment {} not found", name)))?
            + cursor;
        cursor = found + name.len();

        let text = alert_text(body, cursor, name, regional_marker)?;
        outcomes.push(match parse_count(text) {
            Some(count) => RowOutcome::Parsed(EnvironmentRow::new(name.clone(), count)),
            None => RowOutcome::Unparsed {
                name: name.clone(),
                text: text.to_string(),
            },
        });
    }

    Ok(outcomes)
}

/// Text from the first opening parenthesis at or after `from` up to, not
/// including, the closing one.
fn alert_text<'a>(
    body: &'a str,
    from: usize,
    name: &str,
    regional_marker: &str,
) -> Result<&'a str> {
    let missing = |what: &str| ScrapeError::parse(format!("no {} after {}", what, name));

    let mut open = find_from(body, '(', from).ok_or_else(|| missing("alert group"))?;
    if !regional_marker.is_empty() && body[open + 1..].starts_with(regional_marker) {
        open = find_from(body, '(', open + 1)
            .ok_or_else(|| missing("alert group past region tag"))?;
    }
    let close = find_from(body, ')', open).ok_or_else(|| missing("closing parenthesis"))?;
    Ok(&body[open..close])
}

fn find_from(body: &str, needle: char, from: usize) -> Option<usize> {
    body.get(from..)?.find(needle).map(|i| i + from)
}

/// `( 3/ 4` counts the value after the slash; `(7` counts the lone value.
pub fn parse_count(text: &str) -> Option<i64> {
    let digits = match text.find('/') {
        Some(slash) => text[slash + 1..].trim(),
        None => text.trim_start_matches('(').trim(),
    };
    digits.parse::<u32>().ok().map(i64::from)
}
