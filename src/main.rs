//! envsec - Store and retrieve environment secrets.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use envsec::cli::output;
use envsec::cli::{execute, Cli};
use envsec::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("ENVSEC_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("envsec=debug")
        } else {
            EnvFilter::new("envsec=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}

fn suggestion(e: &Error) -> Option<String> {
    if let Some(name) = e.faulty_parameter() {
        return Some(format!(
            "check that your credentials may delete {} in this environment",
            name
        ));
    }
    match e {
        Error::Config(ConfigError::NotInitialized) => {
            Some("add .envsec.toml with a [project] table, or pass --project and --org".into())
        }
        Error::Config(ConfigError::MissingToken) => {
            Some("log in and export ENVSEC_ID_TOKEN and ENVSEC_ACCESS_TOKEN".into())
        }
        _ => None,
    }
}
