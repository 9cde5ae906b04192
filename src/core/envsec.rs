//! The secrets context.
//!
//! [`Envsec`] binds one environment to one store. Names are validated here,
//! once for every backend, before anything reaches the provider.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::domain::{EnvironmentId, SecretEntry};
use crate::core::store::Store;
use crate::core::validation::{parse_set_args, validate_name, validate_names};
use crate::error::Result;

/// Secrets of one environment.
pub struct Envsec {
    env: EnvironmentId,
    store: Box<dyn Store>,
}

impl Envsec {
    pub fn new(env: EnvironmentId, store: Box<dyn Store>) -> Self {
        Self { env, store }
    }

    pub fn environment(&self) -> &EnvironmentId {
        &self.env
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Every secret in the environment, sorted by name.
    pub fn list(&self) -> Result<Vec<SecretEntry>> {
        self.store.list(&self.env)
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        validate_name(name)?;
        self.store.get(&self.env, name)
    }

    pub fn get_all(&self, names: &[String]) -> Result<Vec<SecretEntry>> {
        validate_names(names.iter().map(String::as_str))?;
        self.store.get_all(&self.env, names)
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        validate_name(name)?;
        self.store.set(&self.env, name, value)?;
        debug!(env = %self.env, "secret set");
        Ok(())
    }

    /// Set several secrets. Nothing is written if any name is invalid.
    ///
    /// A single secret goes through [`Envsec::set`], so its error comes back
    /// as is rather than inside a one-element aggregate.
    pub fn set_map(&self, values: &BTreeMap<String, String>) -> Result<()> {
        validate_names(values.keys().map(String::as_str))?;
        match values.iter().next() {
            Some((name, value)) if values.len() == 1 => {
                self.store.set(&self.env, name, value)?
            }
            _ => self.store.set_all(&self.env, values)?,
        }
        debug!(env = %self.env, count = values.len(), "secrets set");
        Ok(())
    }

    /// Set secrets from `NAME=VALUE` arguments, returning the names set.
    pub fn set_from_args(&self, args: &[String]) -> Result<Vec<String>> {
        let values = parse_set_args(args)?;
        self.set_map(&values)?;
        Ok(values.into_keys().collect())
    }

    pub fn delete_all(&self, names: &[String]) -> Result<()> {
        validate_names(names.iter().map(String::as_str))?;
        self.store.delete_all(&self.env, names)?;
        debug!(env = %self.env, count = names.len(), "secrets deleted");
        Ok(())
    }
}
