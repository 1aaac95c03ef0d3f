use anyhow::{Context, Result};
use base64::Engine;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{BufRead, Write};

/// Dashboard login held for the lifetime of a shell session. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    /// Appends `domain_suffix` to the username unless it is already there.
    pub fn new(username: &str, password: impl Into<String>, domain_suffix: &str) -> Self {
        let username = username.trim();
        let username = if username.ends_with(domain_suffix) {
            username.to_string()
        } else {
            format!("{}{}", username, domain_suffix)
        };
        Self {
            username,
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Authorization` header value.
    pub fn authorization(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
        )
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Supplies a fresh credential when the shell starts and on `creds`.
pub trait CredentialSource {
    fn collect(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<Credential>;
}

/// Username from the shell's input, password typed blind on the terminal.
pub struct TerminalPrompt {
    domain_suffix: String,
}

impl TerminalPrompt {
    pub fn new(domain_suffix: impl Into<String>) -> Self {
        Self {
            domain_suffix: domain_suffix.into(),
        }
    }
}

impl CredentialSource for TerminalPrompt {
    fn collect(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<Credential> {
        write!(output, "Enter your username: ")?;
        output.flush()?;
        let mut user = String::new();
        if input.read_line(&mut user)? == 0 {
            anyhow::bail!("No username entered");
        }

        write!(output, "Enter your password: ")?;
        output.flush()?;
        enable_raw_mode().context("Cannot switch terminal to raw mode")?;
        let password = read_masked(output);
        disable_raw_mode()?;
        writeln!(output)?;

        Ok(Credential::new(&user, password?, &self.domain_suffix))
    }
}

/// Read keys until Enter, echoing `*`. Must run in raw mode.
fn read_masked(output: &mut dyn Write) -> Result<String> {
    let mut pass = String::new();
    loop {
        let Event::Key(key) = event::read()? else { continue };
        // Presses only; some terminals also report releases.
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                anyhow::bail!("Password entry cancelled");
            }
            KeyCode::Backspace => {
                if pass.pop().is_some() {
                    write!(output, "\u{8} \u{8}")?;
                }
            }
            KeyCode::Char(c) if !c.is_control() => {
                pass.push(c);
                write!(output, "*")?;
            }
            _ => {}
        }
        output.flush()?;
    }
    Ok(pass)
}
