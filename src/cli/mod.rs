//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Args, Parser, Subcommand};

pub use commands::execute;

use crate::core::constants::DEFAULT_ENV_NAME;

/// envsec - Store and retrieve environment secrets.
#[derive(Parser, Debug)]
#[command(
    name = "envsec",
    about = "Store and retrieve environment secrets per project and environment",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub scope: Scope,

    #[command(subcommand)]
    pub command: Command,
}

/// Which environment a command works on.
#[derive(Args, Debug, Clone)]
pub struct Scope {
    /// Environment name, such as dev or prod
    #[arg(long, global = true, env = "ENVSEC_ENV", default_value = DEFAULT_ENV_NAME)]
    pub env: String,

    /// Organization id; defaults to the project config or the login token
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Project id; defaults to the project config
    #[arg(long, global = true)]
    pub project: Option<String>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List secrets in the environment
    Ls {
        /// Print values instead of masking them
        #[arg(long)]
        show: bool,
    },

    /// Print one secret's value
    Get {
        /// Secret name
        name: String,
    },

    /// Set one or more secrets
    Set {
        /// NAME=VALUE pairs; VALUE may be @file to read it from a file
        #[arg(required = true, value_name = "NAME=VALUE")]
        pairs: Vec<String>,
    },

    /// Remove one or more secrets
    Rm {
        /// Secret names
        #[arg(required = true)]
        names: Vec<String>,
    },
}
