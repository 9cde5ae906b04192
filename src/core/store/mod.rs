//! Secret storage.
//!
//! Provides the [`Store`] abstraction with implementations for different
//! storage backends.
//!
//! ## Backends
//!
//! - **ssm**: AWS Systems Manager Parameter Store (default).
//! - **api**: remote secrets API, one document per secret name.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait
//! 2. Add the implementation in a new module (e.g., `vault/`)
//! 3. Select it in [`open_store`]

use std::collections::BTreeMap;

use crate::core::domain::{EnvironmentId, SecretEntry};
use crate::error::Result;

pub mod addressing;
mod backend;
pub mod remote;
pub mod ssm;

pub use addressing::Addressing;
pub use backend::open_store;
pub use remote::RemoteStore;
pub use ssm::SsmStore;

/// Secret storage trait.
///
/// Every operation is scoped to one [`EnvironmentId`]. Implementations do
/// not validate names; that happens once in [`Envsec`](crate::core::envsec::Envsec)
/// for all backends.
pub trait Store {
    /// List every secret in the environment, sorted by name.
    ///
    /// An empty environment yields an empty list, not an error.
    fn list(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>>;

    /// Get one secret's value, `None` when it doesn't exist.
    fn get(&self, env: &EnvironmentId, name: &str) -> Result<Option<String>> {
        let entries = self.get_all(env, &[name.to_string()])?;
        Ok(entries
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.value))
    }

    /// Get the named secrets that exist; missing names are skipped.
    fn get_all(&self, env: &EnvironmentId, names: &[String]) -> Result<Vec<SecretEntry>>;

    /// Create or overwrite one secret.
    fn set(&self, env: &EnvironmentId, name: &str, value: &str) -> Result<()>;

    /// Create or overwrite several secrets.
    ///
    /// Not atomic. On partial failure the error aggregates every failed name.
    fn set_all(&self, env: &EnvironmentId, values: &BTreeMap<String, String>) -> Result<()>;

    /// Delete one secret.
    fn delete(&self, env: &EnvironmentId, name: &str) -> Result<()> {
        self.delete_all(env, &[name.to_string()])
    }

    /// Delete several secrets. Deleting nothing succeeds.
    fn delete_all(&self, env: &EnvironmentId, names: &[String]) -> Result<()>;

    /// Backend name for display/logging.
    fn name(&self) -> &'static str;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn list(&self, env: &EnvironmentId) -> Result<Vec<SecretEntry>> {
        (**self).list(env)
    }

    fn get(&self, env: &EnvironmentId, name: &str) -> Result<Option<String>> {
        (**self).get(env, name)
    }

    fn get_all(&self, env: &EnvironmentId, names: &[String]) -> Result<Vec<SecretEntry>> {
        (**self).get_all(env, names)
    }

    fn set(&self, env: &EnvironmentId, name: &str, value: &str) -> Result<()> {
        (**self).set(env, name, value)
    }

    fn set_all(&self, env: &EnvironmentId, values: &BTreeMap<String, String>) -> Result<()> {
        (**self).set_all(env, values)
    }

    fn delete(&self, env: &EnvironmentId, name: &str) -> Result<()> {
        (**self).delete(env, name)
    }

    fn delete_all(&self, env: &EnvironmentId, names: &[String]) -> Result<()> {
        (**self).delete_all(env, names)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
