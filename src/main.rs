mod baseline;
mod config;
mod credentials;
mod diff;
mod error;
mod events;
mod parser;
mod pipeline;
mod session;
mod shell;
mod snapshot;
#[cfg(test)]
mod testutil;

use std::io;

fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    let sink = events::ConsoleSink::new(config.verbose);
    let prompt = credentials::TerminalPrompt::new(config.domain_suffix.clone());
    let mut shell = shell::Shell::new(config, prompt, Box::new(sink));

    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    shell.run(&mut input, &mut output)
}
