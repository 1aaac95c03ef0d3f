use crate::credentials::Credential;
use crate::error::{Phase, Result, ScrapeError};
use crate::parser::SessionTokens;
use ureq::http::Response;
use ureq::{Agent, Body};

/// Fields the dashboard's postback handler expects alongside the tokens.
const CLIENT_UTC: (&str, &str) = ("hdClientUTC", "360");
const CLIENT_UTC_FILL: (&str, &str) = ("hdClientUTCFill", "ok");

/// Two-request exchange with the dashboard sharing one cookie store.
pub struct SessionClient {
    agent: Agent,
    url: String,
    authorization: String,
}

impl SessionClient {
    pub fn new(url: impl Into<String>, credential: &Credential) -> Self {
        // Status codes are checked here so failures can name the phase.
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            url: url.into(),
            authorization: credential.authorization(),
        }
    }

    /// Authenticated GET of the dashboard page.
    pub fn bootstrap(&self) -> Result<String> {
        let resp = self
            .agent
            .get(&self.url)
            .header("Authorization", self.authorization.as_str())
            .call();
        read_body(Phase::Bootstrap, resp)
    }

    /// Post the tokens back to obtain the page with alert data.
    pub fn submit(&self, tokens: &SessionTokens) -> Result<String> {
        let form = [
            ("__VIEWSTATE", tokens.view_state.as_str()),
            ("__VIEWSTATEGENERATOR", tokens.generator.as_str()),
            CLIENT_UTC,
            CLIENT_UTC_FILL,
        ];
        let resp = self
            .agent
            .post(&self.url)
            .header("Authorization", self.authorization.as_str())
            .send_form(form);
        read_body(Phase::Submit, resp)
    }
}

fn read_body(
    phase: Phase,
    resp: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<String> {
    let mut resp = resp.map_err(|source| ScrapeError::NetworkFailure { phase, source })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::HttpFailure {
            phase,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown status").to_string(),
        });
    }
    resp.body_mut()
        .read_to_string()
        .map_err(|source| ScrapeError::NetworkFailure { phase, source })
}
