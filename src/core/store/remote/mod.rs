//! Remote secrets API backend.
//!
//! The service keeps one document per secret name, holding a value per
//! environment. There is no pagination and no chunking: reads list the
//! whole project and filter locally, batched writes go out as one
//! multi-action call.
//!
//! A secret whose value in the environment is empty counts as absent, so
//! empty values don't survive a round trip through this backend.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::collate;
use crate::core::domain::{EnvironmentId, SecretEntry, Token};
use crate::core::store::Store;
use crate::core::validation::validate_value_size;
use crate::error::{ProviderError, Result};

pub mod http;

pub use http::ConnectClient;

/// A secret document: one value per environment name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub environment_values: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSecret {
    pub project_id: String,
    /// Only the listed environments are touched
    pub secret: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSecret {
    pub project_id: String,
    pub secret_name: String,
    /// Environments whose value is removed
    pub environments: Vec<String>,
}

/// One step of a batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Patch(PatchSecret),
    Delete(DeleteSecret),
}

/// Secrets service operations.
pub trait SecretsApi {
    fn list_secrets(&self, project_id: &str) -> std::result::Result<Vec<Secret>, ProviderError>;

    fn patch_secret(&self, request: PatchSecret) -> std::result::Result<(), ProviderError>;

    fn delete_secret(&self, request: DeleteSecret) -> std::result::Result<(), ProviderError>;

    /// Apply every action in one call.
    fn batch(&self, actions: Vec<Action>) -> std::result::Result<(), ProviderError>;
}

impl<C: SecretsApi + ?Sized> SecretsApi for Box<C> {
    fn list_secrets(&self, project_id: &str) -> std::result::Result<Vec<Secret>, ProviderError> {
        (**self).list_secrets(project_id)
    }

    fn patch_secret(&self, request: PatchSecret) -> std::result::Result<(), ProviderError> {
        (**self).patch_secret(request)
    }

    fn delete_secret(&self, request: DeleteSecret) -> std::result::Result<(), ProviderError> {
        (**self).delete_secret(request)
    }

    fn batch(&self, actions: Vec<Action>) -> std::result::Result<(), ProviderError> {
        (**self).batch(actions)
    }
}

impl<C: SecretsApi + ?Sized> SecretsApi for &C {
    fn list_secrets(&self, project_id: &str) -> std::result::Result<Vec<Secret>, ProviderError> {
        (**self).list_secrets(project_id)
    }

    fn patch_secret(&self, request: PatchSecret) -> std::result::Result<(), ProviderError> {
        (**self).patch_secret(request)
    }

    fn delete_secret(&self, request: DeleteSecret) -> std::result::Result<(), ProviderError> {
        (**self).delete_secret(request)
    }

    fn batch(&self, actions: Vec<Action>) -> std::result::Result<(), ProviderError> {
        (**self).batch(actions)
    }
}

/// Remote API implementation of [`Store`].
pub struct RemoteStore<C = Box<dyn SecretsApi>> {
    client: C,
}

impl RemoteStore {
    /// Store talking to the service at `api_host` as the token's user.
    pub fn connect(
        api_host: &str,
        token: &Token,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        let client = ConnectClient::new(api_host, &token.access_token, timeout)?;
        Ok(Self::with_client(Box::new(client)))
    }
}

impl<C: SecretsApi> RemoteStore<C> {
    pub fn with_client(client: C) -> Self {
        Self { client }
    }

    fn patch(env: &EnvironmentId, name: &str, value: &str) -> PatchSecret {
        PatchSecret {
            project_id: env.project_id().to_string(),
            secret: Secret {
                name: name.to_string(),
                environment_values: BTreeMap::from([(
                    env.env_name().to_string(),
                    value.as_bytes().to_vec(),
                )]),
            },
        }
    }

    fn delete_request(env: &EnvironmentId, name: &str) -> DeleteSecret {
        DeleteSecret {
            project_id: env.project_id().to_string(),
            secret_name: name.to_string(),
            environments: vec![env.env_name().to_string()],
        }
    }
}

impl<C: SecretsApi> Store for RemoteStore<C> {
    fn list(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>> {
        let secrets = self.client.list_secrets(env.project_id())?;
        let total = secrets.len();

        let mut entries: Vec<SecretEntry> = secrets
            .into_iter()
            .filter_map(|secret| {
                let value = secret.environment_values.get(env.env_name())?;
                if value.is_empty() {
                    return None;
                }
                Some(SecretEntry::new(
                    secret.name.clone(),
                    String::from_utf8_lossy(value).into_owned(),
                ))
            })
            .collect();
        collate::sort_entries(&mut entries);

        debug!(env = %env, total, count = entries.len(), "listed remote secrets");
        Ok(entries)
    }

    fn get_all(&self, env: &EnvironmentId, names: &[String]) -> Result<Vec<SecretEntry>> {
        let entries = self.list(env)?;
        Ok(entries
            .into_iter()
            .filter(|e| names.iter().any(|n| *n == e.name))
            .collect())
    }

    fn set(&self, env: &EnvironmentId, name: &str, value: &str) -> Result<()> {
        validate_value_size(name, value)?;
        self.client.patch_secret(Self::patch(env, name, value))?;
        debug!(env = %env, "patched remote secret");
        Ok(())
    }

    fn set_all(&self, env: &EnvironmentId, values: &BTreeMap<String, String>) -> Result<()> {
        for (name, value) in values {
            validate_value_size(name, value)?;
        }
        let actions = values
            .iter()
            .map(|(name, value)| Action::Patch(Self::patch(env, name, value)))
            .collect();
        self.client.batch(actions)?;
        debug!(env = %env, count = values.len(), "patched remote secrets");
        Ok(())
    }

    fn delete(&self, env: &EnvironmentId, name: &str) -> Result<()> {
        self.client.delete_secret(Self::delete_request(env, name))?;
        Ok(())
    }

    fn delete_all(&self, env: &EnvironmentId, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let actions = names
            .iter()
            .map(|name| Action::Delete(Self::delete_request(env, name)))
            .collect();
        self.client.batch(actions)?;
        debug!(env = %env, count = names.len(), "deleted remote secrets");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
