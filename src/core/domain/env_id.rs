//! Environment identifier.
//!
//! The (organization, project, environment) triple that namespaces a set of
//! secrets.

use std::fmt;

use crate::error::{Result, ValidationError};

/// Uniquely identifies an environment in which secrets are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentId {
    org_id: String,
    project_id: String,
    env_name: String,
}

impl EnvironmentId {
    /// Create an identifier for an initialized project.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyProjectId` if `project_id` is empty.
    pub fn new(
        org_id: impl Into<String>,
        project_id: impl Into<String>,
        env_name: impl Into<String>,
    ) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.is_empty() {
            return Err(ValidationError::EmptyProjectId.into());
        }
        Ok(Self {
            org_id: org_id.into(),
            project_id,
            env_name: env_name.into(),
        })
    }

    /// Org-only identifier, for data written before projects existed.
    pub fn for_org(org_id: impl Into<String>, env_name: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            project_id: String::new(),
            env_name: env_name.into(),
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Environment name within the project, usually `dev` or `prod`.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.org_id, self.project_id, self.env_name)
    }
}
