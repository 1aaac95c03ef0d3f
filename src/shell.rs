use crate::baseline::BaselineStore;
use crate::config::Config;
use crate::credentials::{Credential, CredentialSource};
use crate::events::EventSink;
use crate::pipeline;
use crate::snapshot::format_timestamp;
use anyhow::{Context, Result};
use chrono::Local;
use std::io::{BufRead, Write};

pub const PROMPT: &str = "GetDashboardChanges> ";
pub const NO_BASELINE: &str = "No previous scrape found.";

const HELP: &str = "Commands:
\tscrape\tscrape the dashboard and show diff from current baseline
\tset\tscrapes and set the baseline
\tget\tgets the current baseline (ignore diff in this case)
\tcreds\tset credentials for the dashboard
\thelp\toutput command helptext
\texit\texit GetDashboardChanges
\tquit\tsame as exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Scrape,
    Get,
    Set,
    Creds,
    Help,
    Exit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        match input.to_lowercase().as_str() {
            "scrape" => Command::Scrape,
            "get" => Command::Get,
            "set" => Command::Set,
            "creds" => Command::Creds,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            "" => Command::Empty,
            _ => Command::Invalid(input.to_string()),
        }
    }
}

/// Interactive session: one command at a time, blocking on each input line.
pub struct Shell<S> {
    config: Config,
    store: BaselineStore,
    source: S,
    sink: Box<dyn EventSink>,
}

impl<S: CredentialSource> Shell<S> {
    pub fn new(config: Config, source: S, sink: Box<dyn EventSink>) -> Self {
        let store = BaselineStore::new(&config.baseline_path);
        Self {
            config,
            store,
            source,
            sink,
        }
    }

    /// Collect credentials, then serve commands until `exit`, `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<()> {
        let mut credential = self
            .source
            .collect(input, output)
            .context("Credentials are required to reach the dashboard")?;

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            match Command::parse(&line) {
                Command::Exit => return Ok(()),
                Command::Empty => {}
                Command::Help => writeln!(output, "{}", HELP)?,
                Command::Scrape => self.scrape(&credential, output)?,
                Command::Get => self.get(output)?,
                Command::Set => self.set(&credential, output)?,
                Command::Creds => self.creds(&mut credential, input, output)?,
                Command::Invalid(cmd) => writeln!(
                    output,
                    "Invalid command: {}\nType \"help\" for a list.",
                    cmd.to_uppercase()
                )?,
            }
        }
    }

    /// Scrape and print the diff against the baseline. Nothing is persisted.
    fn scrape<W: Write>(&self, credential: &Credential, output: &mut W) -> Result<()> {
        let result = match pipeline::scrape(&self.config, credential, &self.store, &*self.sink) {
            Ok(result) => result,
            Err(e) => return report(output, &e),
        };

        let from = result
            .previous
            .as_ref()
            .map(|b| b.timestamp.as_str())
            .unwrap_or(NO_BASELINE);
        writeln!(output, "FROM\n{}\nTO", from)?;
        for line in result.snapshot.to_lines() {
            writeln!(output, "{}", line)?;
        }
        Ok(())
    }

    fn get<W: Write>(&self, output: &mut W) -> Result<()> {
        match self.store.read() {
            Ok(Some(baseline)) => {
                for line in baseline.render_without_diff() {
                    writeln!(output, "{}", line)?;
                }
                Ok(())
            }
            Ok(None) => Ok(writeln!(output, "{}", NO_BASELINE)?),
            Err(e) => report(output, &e),
        }
    }

    fn set<W: Write>(&self, credential: &Credential, output: &mut W) -> Result<()> {
        match pipeline::scrape_and_store(&self.config, credential, &self.store, &*self.sink) {
            Ok(_) => Ok(writeln!(
                output,
                "Write completed at {}.",
                format_timestamp(&Local::now())
            )?),
            Err(e) => report(output, &e),
        }
    }

    /// Replace the session credential. A failed prompt keeps the old one.
    fn creds<R: BufRead, W: Write>(
        &mut self,
        current: &mut Credential,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        match self.source.collect(input, output) {
            Ok(credential) => *current = credential,
            Err(e) => writeln!(output, "Credentials unchanged: {:#}", e)?,
        }
        Ok(())
    }
}

fn report<W: Write>(output: &mut W, err: &dyn std::error::Error) -> Result<()> {
    writeln!(output, "{}", err)?;
    Ok(())
}
