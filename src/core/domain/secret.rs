//! Secret entry type.

use serde::{Deserialize, Serialize};

use crate::core::types::{SecretName, SecretValue};

/// A named secret and its plaintext value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretEntry {
    pub name: SecretName,
    pub value: SecretValue,
}

impl SecretEntry {
    pub fn new(name: impl Into<SecretName>, value: impl Into<SecretValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// Only the name; values never end up in logs or output by accident.
impl std::fmt::Display for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
