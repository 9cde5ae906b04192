//! AWS Systems Manager Parameter Store backend.
//!
//! Each secret is one SecureString parameter. The store absorbs the
//! provider's limits:
//!
//! - batched get/delete take at most ten names, so requests are chunked;
//! - SecureString can't hold `""`, so empty values are stored as a
//!   placeholder and mapped back on read;
//! - values are capped at 4KB, checked before any call;
//! - creating an existing parameter falls back to an overwrite, so `set`
//!   is idempotent.
//!
//! ## Usage
//!
//! ```toml
//! [store]
//! backend = "ssm"
//! region = "us-west-2"
//! kms_key_id = "alias/envsec"
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, trace};

use crate::core::collate;
use crate::core::config::StoreConfig;
use crate::core::constants::{EMPTY_STRING_PLACEHOLDER, PARAMETER_BATCH_LIMIT};
use crate::core::domain::{EnvironmentId, SecretEntry};
use crate::core::federation::Credentials;
use crate::core::store::addressing::{name_from_path, name_from_tags, Addressing, Tag};
use crate::core::store::Store;
use crate::core::types::ProviderId;
use crate::core::validation::validate_value_size;
use crate::error::{AggregateError, Error, Result, StoreError};

pub mod api;
#[cfg(feature = "aws")]
pub mod aws;

pub use api::ParameterApi;
use api::{PutParameter, ACCESS_DENIED, PARAMETER_ALREADY_EXISTS};

/// Parameter Store connection and addressing settings.
#[derive(Debug, Clone, Default)]
pub struct SsmConfig {
    /// Region override; the SDK's default chain when unset
    pub region: Option<String>,
    /// Static credentials; the SDK's default chain when unset
    pub credentials: Option<Credentials>,
    pub kms_key_id: Option<String>,
    pub endpoint_url: Option<String>,
    pub timeout: Option<Duration>,
    pub addressing: Addressing,
}

impl SsmConfig {
    /// Settings from the project's `[store]` table.
    pub fn from_store_config(store: &StoreConfig) -> Self {
        Self {
            region: store.region.clone(),
            credentials: None,
            kms_key_id: store.kms_key_id.clone(),
            endpoint_url: store.endpoint_url.clone(),
            timeout: store.timeout(),
            addressing: Addressing::Path,
        }
    }

    /// Settings for federated credentials, everything else default.
    pub fn from_credentials(credentials: Credentials, region: impl Into<String>) -> Self {
        Self::default().with_credentials(credentials, region)
    }

    /// Use federated credentials in their issuing region.
    pub fn with_credentials(mut self, credentials: Credentials, region: impl Into<String>) -> Self {
        self.credentials = Some(credentials);
        self.region = Some(region.into());
        self
    }

    pub fn with_addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = addressing;
        self
    }
}

/// A parameter about to be written.
#[derive(Debug, Clone)]
struct Parameter {
    id: ProviderId,
    tags: Vec<Tag>,
}

impl Parameter {
    fn name(&self) -> &str {
        name_from_tags(&self.tags).unwrap_or_else(|| name_from_path(&self.id))
    }
}

/// Parameter Store implementation of [`Store`].
pub struct SsmStore<A = Box<dyn ParameterApi>> {
    api: A,
    config: SsmConfig,
}

#[cfg(feature = "aws")]
impl SsmStore {
    /// Connect to Parameter Store with the AWS SDK.
    pub fn connect(config: SsmConfig) -> Result<Self> {
        let api = aws::SdkParameterApi::new(&config)?;
        Ok(Self {
            api: Box::new(api),
            config,
        })
    }
}

impl<A: ParameterApi> SsmStore<A> {
    /// Store over an arbitrary [`ParameterApi`].
    pub fn with_api(config: SsmConfig, api: A) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &SsmConfig {
        &self.config
    }

    /// Create the parameter, or overwrite it if it already exists.
    fn put(&self, param: &Parameter, value: &str) -> Result<()> {
        validate_value_size(param.name(), value)?;

        let input = PutParameter {
            name: param.id.clone(),
            value: to_provider_value(value).to_string(),
            tags: param.tags.clone(),
            // Only when present; otherwise the account's default key is used.
            kms_key_id: self.config.kms_key_id.clone(),
            overwrite: false,
        };

        match self.api.put_parameter(input) {
            Ok(()) => {
                trace!(name = param.name(), "parameter created");
                Ok(())
            }
            Err(e) if e.has_code(PARAMETER_ALREADY_EXISTS) => self.overwrite(param, value),
            Err(e) => Err(e.into()),
        }
    }

    fn overwrite(&self, param: &Parameter, value: &str) -> Result<()> {
        trace!(name = param.name(), "parameter exists, overwriting");
        let input = PutParameter {
            name: param.id.clone(),
            value: to_provider_value(value).to_string(),
            tags: Vec::new(),
            kms_key_id: self.config.kms_key_id.clone(),
            overwrite: true,
        };
        self.api.put_parameter(input).map_err(Error::from)
    }

    fn list_by_path(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>> {
        let path = self.config.addressing.env_path(env);
        let mut results = Vec::new();
        let mut next_token = None;

        loop {
            let page = self.api.get_parameters_by_path(&path, next_token)?;
            results.extend(page.items.into_iter().map(|p| {
                SecretEntry::new(name_from_path(&p.name), from_provider_value(p.value))
            }));
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        collate::sort_entries(&mut results);
        debug!(env = %env, path = %path, count = results.len(), "listed parameters by path");
        Ok(results)
    }

    /// Describe by tag, then recover each name from its `name` tag.
    ///
    /// Paths are caller-defined in this mode, so the id says nothing about
    /// the name. Parameters without a `name` tag are skipped.
    fn list_by_tags(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>> {
        let filters = self.config.addressing.filters(env);
        let mut ids = Vec::new();
        let mut next_token = None;

        loop {
            let page = self.api.describe_parameters(&filters, next_token)?;
            ids.extend(page.items.into_iter().map(|p| p.name));
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        let mut named = Vec::with_capacity(ids.len());
        for id in ids {
            let tags = self.api.list_tags(&id)?;
            match name_from_tags(&tags) {
                Some(name) => named.push((name.to_string(), id)),
                None => debug!(parameter = %id, "skipping parameter without name tag"),
            }
        }

        debug!(env = %env, count = named.len(), "described parameters by tag");
        self.get_by_ids(&named)
    }

    /// Fetch `(name, id)` pairs; entries carry the caller's names.
    fn get_by_ids(&self, resolved: &[(String, ProviderId)]) -> Result<Vec<SecretEntry>> {
        let mut results = Vec::new();

        for (i, chunk) in resolved.chunks(PARAMETER_BATCH_LIMIT).enumerate() {
            let ids: Vec<ProviderId> = chunk.iter().map(|(_, id)| id.clone()).collect();
            // One failed chunk fails the whole request.
            let output = self.api.get_parameters(&ids)?;
            if !output.invalid_parameters.is_empty() {
                debug!(
                    chunk = i,
                    missing = output.invalid_parameters.len(),
                    "some parameters not found"
                );
            }

            let names: HashMap<&str, &str> = chunk
                .iter()
                .map(|(name, id)| (id.as_str(), name.as_str()))
                .collect();
            for p in output.parameters {
                let name = names
                    .get(p.name.as_str())
                    .copied()
                    .unwrap_or_else(|| name_from_path(&p.name))
                    .to_string();
                results.push(SecretEntry::new(name, from_provider_value(p.value)));
            }
        }

        collate::sort_entries(&mut results);
        Ok(results)
    }

    fn resolve(&self, env: &EnvironmentId, names: &[String]) -> Vec<(String, ProviderId)> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| (name.clone(), self.config.addressing.var_path(env, name)))
            .collect()
    }
}

impl<A: ParameterApi> Store for SsmStore<A> {
    fn list(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>> {
        if self.config.addressing.is_tagged() {
            self.list_by_tags(env)
        } else {
            self.list_by_path(env)
        }
    }

    fn get_all(&self, env: &EnvironmentId, names: &[String]) -> Result<Vec<SecretEntry>> {
        self.get_by_ids(&self.resolve(env, names))
    }

    fn set(&self, env: &EnvironmentId, name: &str, value: &str) -> Result<()> {
        let param = Parameter {
            id: self.config.addressing.var_path(env, name),
            tags: self.config.addressing.tags(env, name),
        };
        self.put(&param, value)
    }

    fn set_all(&self, env: &EnvironmentId, values: &BTreeMap<String, String>) -> Result<()> {
        // One call per secret; SSM has no batched put.
        let mut errors = Vec::new();
        for (name, value) in values {
            match self.set(env, name, value) {
                Ok(()) => {}
                Err(e @ Error::Validation(_)) => errors.push(e),
                Err(e) => errors.push(
                    StoreError::Chunk {
                        action: "set",
                        names: vec![name.clone()],
                        source: Box::new(e),
                    }
                    .into(),
                ),
            }
        }
        debug!(env = %env, count = values.len(), failed = errors.len(), "set parameters");
        AggregateError::new(errors).into_result()
    }

    fn delete_all(&self, env: &EnvironmentId, names: &[String]) -> Result<()> {
        let resolved = self.resolve(env, names);
        let mut errors = Vec::new();

        for (i, chunk) in resolved.chunks(PARAMETER_BATCH_LIMIT).enumerate() {
            let ids: Vec<ProviderId> = chunk.iter().map(|(_, id)| id.clone()).collect();
            match self.api.delete_parameters(&ids) {
                Ok(output) => {
                    trace!(
                        chunk = i,
                        deleted = output.deleted_parameters.len(),
                        missing = output.invalid_parameters.len(),
                        "deleted parameter chunk"
                    );
                }
                Err(e) if e.has_code(ACCESS_DENIED) => {
                    let faulty = faulty_parameter(&e.message);
                    debug!(chunk = i, parameter = faulty, "delete denied");
                    errors.push(StoreError::FaultyParameter(faulty.to_string()).into());
                }
                Err(e) => {
                    debug!(chunk = i, error = %e, "delete chunk failed");
                    errors.push(
                        StoreError::Chunk {
                            action: "delete",
                            names: chunk.iter().map(|(name, _)| name.clone()).collect(),
                            source: Box::new(e.into()),
                        }
                        .into(),
                    );
                }
            }
        }

        debug!(env = %env, count = resolved.len(), failed = errors.len(), "deleted parameters");
        AggregateError::new(errors).into_result()
    }

    fn name(&self) -> &'static str {
        "ssm"
    }
}

/// Parameter name an access-denied message refers to.
///
/// The message ends with the denied resource ARN, e.g.
/// `... on resource: arn:aws:ssm:us-west-2:1:parameter/a/b/SECRET because ...`.
pub fn faulty_parameter(message: &str) -> &str {
    let tail = message.rsplit('/').next().unwrap_or(message);
    tail.split(' ').next().unwrap_or(tail)
}

fn to_provider_value(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_STRING_PLACEHOLDER
    } else {
        value
    }
}

fn from_provider_value(value: String) -> String {
    if value == EMPTY_STRING_PLACEHOLDER {
        String::new()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_mapping() {
        assert_eq!(to_provider_value(""), EMPTY_STRING_PLACEHOLDER);
        assert_eq!(to_provider_value("x"), "x");
        assert_eq!(from_provider_value(EMPTY_STRING_PLACEHOLDER.to_string()), "");
        assert_eq!(from_provider_value("x".to_string()), "x");
    }

    #[test]
    fn test_faulty_parameter_from_arn_message() {
        let msg = "User: arn:aws:sts::1:assumed-role/dev/bob is not authorized to perform: \
                   ssm:DeleteParameters on resource: \
                   arn:aws:ssm:us-west-2:1:parameter/jetpack-data/env/org/proj/dev/secretX \
                   because no identity-based policy allows the ssm:DeleteParameters action";
        assert_eq!(faulty_parameter(msg), "secretX");
    }

    #[test]
    fn test_faulty_parameter_without_trailer() {
        assert_eq!(faulty_parameter("denied: parameter/a/b/TOKEN"), "TOKEN");
    }

    #[test]
    fn test_parameter_name_prefers_tag() {
        let param = Parameter {
            id: "/opaque/id-123".to_string(),
            tags: vec![Tag::new("name", "API_KEY")],
        };
        assert_eq!(param.name(), "API_KEY");

        let untagged = Parameter {
            tags: Vec::new(),
            ..param
        };
        assert_eq!(untagged.name(), "id-123");
    }
}
