//! Configuration.
//!
//! Two layers:
//! - [`Config`]: the project file `.envsec.toml`, written once a project is
//!   initialized and committed alongside the code.
//! - [`Settings`]: per-invocation values read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::domain::{EnvironmentId, Token};
use crate::error::{ConfigError, Result};

/// Project configuration stored in `.envsec.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Identity of the project this directory belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub org_id: String,
    pub project_id: String,
}

/// Which backend holds the secrets and how to reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// AWS region of the parameter store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// KMS key for SecureString parameters; the account default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Upper bound for each provider call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StoreConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// AWS Systems Manager Parameter Store
    #[default]
    Ssm,
    /// Remote secrets API
    Api,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ssm => "ssm",
            Self::Api => "api",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ssm" => Ok(Self::Ssm),
            "api" | "jetpack" => Ok(Self::Api),
            other => Err(crate::error::StoreError::UnknownBackend(other.to_string()).into()),
        }
    }
}

impl Config {
    /// Create a configuration for a project.
    pub fn new(org_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            project: ProjectConfig {
                org_id: org_id.into(),
                project_id: project_id.into(),
            },
            store: StoreConfig::default(),
        }
    }

    /// Path to the configuration file in the current directory
    pub fn config_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Check if a configuration file exists in the current directory
    pub fn exists() -> bool {
        Self::config_path().exists()
    }

    /// Load configuration from `.envsec.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotInitialized` if the file doesn't exist,
    /// or `ConfigError::Parse` if the TOML is malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotInitialized.into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(
            org = %config.project.org_id,
            project = %config.project.project_id,
            backend = config.store.backend.name(),
            "config loaded"
        );

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `.envsec.toml` in the current directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving config");
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate the configuration contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the project id is empty, or
    /// `ConfigError::InvalidValue` for a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.project.project_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project.project_id",
            }
            .into());
        }
        if self.store.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "store.timeout_secs",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Identifier of `env_name` within this project.
    pub fn environment(&self, env_name: &str) -> Result<EnvironmentId> {
        EnvironmentId::new(
            self.project.org_id.clone(),
            self.project.project_id.clone(),
            env_name,
        )
    }
}

/// Values read from the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend override from `ENVSEC_STORE`
    pub backend: Option<Backend>,
    pub api_host: String,
    pub auth_domain: String,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let backend = get("ENVSEC_STORE").map(|b| b.parse::<Backend>()).transpose()?;
        Ok(Self {
            backend,
            api_host: get("ENVSEC_API_HOST").unwrap_or_else(|| constants::DEFAULT_API_HOST.into()),
            auth_domain: get("ENVSEC_AUTH_DOMAIN")
                .unwrap_or_else(|| constants::DEFAULT_AUTH_DOMAIN.into()),
            id_token: get("ENVSEC_ID_TOKEN"),
            access_token: get("ENVSEC_ACCESS_TOKEN"),
        })
    }

    /// Backend to use: the environment override, else the project's choice.
    pub fn backend_for(&self, store: &StoreConfig) -> Backend {
        self.backend.unwrap_or(store.backend)
    }

    /// The session handed over by the login flow, if any.
    pub fn token(&self) -> Option<Token> {
        let id_token = self.id_token.as_ref()?;
        let access = self.access_token.clone().unwrap_or_default();
        Some(Token::new(access, id_token.clone()))
    }
}
