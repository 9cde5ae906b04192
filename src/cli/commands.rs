//! Command implementations.

use tracing::debug;

use crate::cli::{output, Cli, Command, Scope};
use crate::core::config::{Config, Settings};
use crate::core::domain::{EnvironmentId, Token};
use crate::core::envsec::Envsec;
use crate::core::store::open_store;
use crate::core::validation::{validate_names, validate_set_args};
use crate::error::{ConfigError, Result};

const MASK: &str = "*****";

/// Execute a parsed command line.
///
/// Arguments are checked before the config is read or any store is
/// opened, so malformed input never costs a network round trip.
pub fn execute(cli: Cli) -> Result<()> {
    check_args(&cli.command)?;

    let settings = Settings::from_env()?;
    let token = settings.token();
    let config = if Config::exists() {
        Some(Config::load()?)
    } else {
        None
    };

    let env = resolve_environment(&cli.scope, config.as_ref(), token.as_ref())?;
    debug!(env = %env, "resolved environment");

    let store_config = config.map(|c| c.store).unwrap_or_default();
    let store = open_store(&settings, &store_config, token.as_ref())?;
    let envsec = Envsec::new(env, store);

    match cli.command {
        Command::Ls { show } => cmd_ls(&envsec, show),
        Command::Get { name } => cmd_get(&envsec, &name),
        Command::Set { pairs } => cmd_set(&envsec, &pairs),
        Command::Rm { names } => cmd_rm(&envsec, &names),
    }
}

fn check_args(command: &Command) -> Result<()> {
    match command {
        Command::Set { pairs } => {
            validate_set_args(pairs)?;
            validate_names(
                pairs
                    .iter()
                    .filter_map(|p| p.split_once('=').map(|(name, _)| name)),
            )
        }
        Command::Rm { names } => validate_names(names.iter().map(String::as_str)),
        Command::Get { name } => validate_names([name.as_str()]),
        Command::Ls { .. } => Ok(()),
    }
}

/// Environment from flags, then the project config, then the token.
///
/// A project id is required from the flags or the config. The org comes
/// from `--org`, the token, or the config, in that order; when the config
/// supplies the project its org must agree with the resolved one.
pub fn resolve_environment(
    scope: &Scope,
    config: Option<&Config>,
    token: Option<&Token>,
) -> Result<EnvironmentId> {
    let project_id = match (&scope.project, config) {
        (Some(project), _) => project.clone(),
        (None, Some(config)) => config.project.project_id.clone(),
        (None, None) => return Err(ConfigError::NotInitialized.into()),
    };

    let config_org = config
        .map(|c| c.project.org_id.as_str())
        .filter(|org| !org.is_empty());
    let org_id = scope
        .org
        .as_deref()
        .or_else(|| token.and_then(Token::org_id))
        .or(config_org)
        .unwrap_or_default()
        .to_string();

    if scope.project.is_none() {
        if let Some(config_org) = config_org {
            if config_org != org_id {
                return Err(ConfigError::InvalidValue {
                    field: "org_id",
                    reason: format!(
                        "project {} does not belong to organization {}",
                        project_id, org_id
                    ),
                }
                .into());
            }
        }
    }

    EnvironmentId::new(org_id, project_id, scope.env.clone())
}

fn cmd_ls(envsec: &Envsec, show: bool) -> Result<()> {
    let entries = envsec.list()?;
    let env_name = envsec.environment().env_name();

    if entries.is_empty() {
        output::dimmed(&format!("no secrets in environment {}", env_name));
        return Ok(());
    }

    output::header(&format!("Environment: {}", env_name));
    for entry in &entries {
        output::secret(&entry.name, if show { entry.value.as_str() } else { MASK });
    }
    Ok(())
}

fn cmd_get(envsec: &Envsec, name: &str) -> Result<()> {
    match envsec.get(name)? {
        Some(value) => println!("{}", value),
        None => output::warn(&format!(
            "{} is not set in environment {}",
            name,
            envsec.environment().env_name()
        )),
    }
    Ok(())
}

fn cmd_set(envsec: &Envsec, pairs: &[String]) -> Result<()> {
    let names = envsec.set_from_args(pairs)?;
    output::success(&format!(
        "set environment {} {} in environment: {}",
        output::plural(names.len()),
        output::quoted(&names),
        envsec.environment().env_name()
    ));
    Ok(())
}

fn cmd_rm(envsec: &Envsec, names: &[String]) -> Result<()> {
    envsec.delete_all(names)?;
    output::success(&format!(
        "deleted environment {} {} in environment: {}",
        output::plural(names.len()),
        output::quoted(names),
        envsec.environment().env_name()
    ));
    Ok(())
}
