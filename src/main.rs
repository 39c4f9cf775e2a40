//! Satchel - team secrets, scoped per deployment environment.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use satchel::cli::output;
use satchel::cli::{execute, Cli};
use satchel::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("SATCHEL_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("satchel=debug")
        } else {
            EnvFilter::new("satchel=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command) {
        let suggestion = match &e {
            Error::Config(ConfigError::NotInitialized) => Some("run: satchel init <name>"),
            Error::Config(ConfigError::NotLoggedIn) => Some("run: satchel login"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
