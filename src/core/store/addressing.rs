//! Parameter addressing.
//!
//! Maps an [`EnvironmentId`] and secret name to a provider identifier and
//! back. Two strategies:
//!
//! - **Path** (default): `/jetpack-data/env/<org>/<project>/<env>/<name>`.
//!   Listing is a single recursive by-path query.
//! - **Tagged**: the caller supplies its own path functions, so paths carry
//!   no fixed per-org root. Every parameter is tagged with `org-id`,
//!   `project-id`, `env-name` and `name`, and listing filters on those tags.
//!
//! Everything here is pure.

use std::fmt;
use std::sync::Arc;

use crate::core::constants::{
    PATH_PREFIX, TAG_ENV_NAME, TAG_NAME, TAG_ORG_ID, TAG_PROJECT_ID,
};
use crate::core::domain::EnvironmentId;
use crate::core::types::ProviderId;

/// Custom `(env, name) -> path` function.
pub type VarPathFn = Arc<dyn Fn(&EnvironmentId, &str) -> String + Send + Sync>;

/// Custom `env -> namespace root` function.
pub type NamespaceFn = Arc<dyn Fn(&EnvironmentId) -> String + Send + Sync>;

/// A key/value tag attached to a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One equality filter of a describe query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterFilter {
    /// `Path` or `tag:<key>`
    pub key: String,
    /// `Recursive` for path filters
    pub option: Option<String>,
    pub values: Vec<String>,
}

/// How secrets are located at the provider.
#[derive(Clone, Default)]
pub enum Addressing {
    #[default]
    Path,
    Tagged {
        var_path: Option<VarPathFn>,
        namespace: Option<NamespaceFn>,
    },
}

impl Addressing {
    /// Addressing from optional custom path functions.
    ///
    /// With neither function this is plain path addressing.
    pub fn custom(var_path: Option<VarPathFn>, namespace: Option<NamespaceFn>) -> Self {
        if var_path.is_none() && namespace.is_none() {
            Self::Path
        } else {
            Self::Tagged {
                var_path,
                namespace,
            }
        }
    }

    /// Tagged addressing with a custom per-secret path.
    pub fn with_var_path(
        f: impl Fn(&EnvironmentId, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self::custom(Some(Arc::new(f)), None)
    }

    /// Tagged addressing with a custom namespace root.
    pub fn with_namespace(f: impl Fn(&EnvironmentId) -> String + Send + Sync + 'static) -> Self {
        Self::custom(None, Some(Arc::new(f)))
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, Self::Tagged { .. })
    }

    /// Root under which every parameter of the environment's org lives.
    pub fn namespace(&self, env: &EnvironmentId) -> String {
        if let Self::Tagged {
            namespace: Some(f), ..
        } = self
        {
            return f(env);
        }
        join_path(&[PATH_PREFIX, env.org_id()])
    }

    /// Provider identifier of one secret.
    pub fn var_path(&self, env: &EnvironmentId, name: &str) -> ProviderId {
        if let Self::Tagged {
            var_path: Some(f), ..
        } = self
        {
            return f(env, name);
        }
        join_path(&[
            &self.namespace(env),
            env.project_id(),
            env.env_name(),
            name,
        ])
    }

    /// Path whose recursive listing yields every secret of the environment.
    pub fn env_path(&self, env: &EnvironmentId) -> String {
        self.var_path(env, "")
    }

    /// Tags attached to a created parameter. Empty components are skipped.
    pub fn tags(&self, env: &EnvironmentId, name: &str) -> Vec<Tag> {
        [
            (TAG_PROJECT_ID, env.project_id()),
            (TAG_ORG_ID, env.org_id()),
            (TAG_ENV_NAME, env.env_name()),
            (TAG_NAME, name),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| Tag::new(key, value))
        .collect()
    }

    /// Describe filters selecting every parameter of the environment.
    ///
    /// Tags only: custom paths have no common root to scope by. Each
    /// non-empty component of the id becomes an equality filter.
    pub fn filters(&self, env: &EnvironmentId) -> Vec<ParameterFilter> {
        [
            (TAG_PROJECT_ID, env.project_id()),
            (TAG_ORG_ID, env.org_id()),
            (TAG_ENV_NAME, env.env_name()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| ParameterFilter {
            key: format!("tag:{}", key),
            option: None,
            values: vec![value.to_string()],
        })
        .collect()
    }
}

impl fmt::Debug for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => f.write_str("Path"),
            Self::Tagged {
                var_path,
                namespace,
            } => f
                .debug_struct("Tagged")
                .field("custom_var_path", &var_path.is_some())
                .field("custom_namespace", &namespace.is_some())
                .finish(),
        }
    }
}

/// Secret name from a provider path: its last segment.
pub fn name_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Secret name from a parameter's tags.
pub fn name_from_tags(tags: &[Tag]) -> Option<&str> {
    tags.iter()
        .find(|t| t.key == TAG_NAME)
        .map(|t| t.value.as_str())
}

/// Join path segments with `/`, dropping empty segments and duplicate
/// separators. Absolute when the first segment is.
pub fn join_path(parts: &[&str]) -> String {
    let absolute = parts.first().is_some_and(|p| p.starts_with('/'));
    let joined = parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvironmentId {
        EnvironmentId::new("org_1", "proj_1", "dev").unwrap()
    }

    #[test]
    fn test_default_var_path() {
        let addressing = Addressing::Path;
        assert_eq!(
            addressing.var_path(&env(), "DB_URL"),
            "/jetpack-data/env/org_1/proj_1/dev/DB_URL"
        );
        assert_eq!(
            addressing.env_path(&env()),
            "/jetpack-data/env/org_1/proj_1/dev"
        );
    }

    #[test]
    fn test_org_only_path() {
        let id = EnvironmentId::for_org("org_1", "prod");
        assert_eq!(
            Addressing::Path.var_path(&id, "K"),
            "/jetpack-data/env/org_1/prod/K"
        );
    }

    #[test]
    fn test_custom_functions_select_tagged() {
        assert!(!Addressing::custom(None, None).is_tagged());

        let addressing = Addressing::with_var_path(|env, name| {
            format!("/{}/{}/{}", env.project_id(), env.env_name(), name)
        });
        assert!(addressing.is_tagged());
        assert_eq!(addressing.var_path(&env(), "K"), "/proj_1/dev/K");
        // namespace keeps its default
        assert_eq!(addressing.namespace(&env()), "/jetpack-data/env/org_1");
    }

    #[test]
    fn test_custom_namespace_flows_into_var_path() {
        let addressing = Addressing::with_namespace(|env| format!("/tenants/{}", env.project_id()));
        assert_eq!(
            addressing.var_path(&env(), "K"),
            "/tenants/proj_1/proj_1/dev/K"
        );
    }

    #[test]
    fn test_tags() {
        let tags = Addressing::Path.tags(&env(), "K");
        assert_eq!(
            tags,
            vec![
                Tag::new("project-id", "proj_1"),
                Tag::new("org-id", "org_1"),
                Tag::new("env-name", "dev"),
                Tag::new("name", "K"),
            ]
        );
        assert_eq!(name_from_tags(&tags), Some("K"));
    }

    #[test]
    fn test_tags_skip_empty_components() {
        let id = EnvironmentId::for_org("org_1", "dev");
        let keys: Vec<String> = Addressing::Path
            .tags(&id, "K")
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(keys, vec!["org-id", "env-name", "name"]);
    }

    #[test]
    fn test_filters() {
        let filters = Addressing::Path.filters(&env());
        let keys: Vec<&str> = filters.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["tag:project-id", "tag:org-id", "tag:env-name"]);
        assert!(filters.iter().all(|f| f.option.is_none()));
        assert_eq!(filters[2].values, vec!["dev"]);
    }

    #[test]
    fn test_filters_skip_empty_project() {
        let id = EnvironmentId::for_org("org_1", "prod");
        let keys: Vec<String> = Addressing::Path
            .filters(&id)
            .into_iter()
            .map(|f| f.key)
            .collect();
        assert_eq!(keys, vec!["tag:org-id", "tag:env-name"]);
    }

    #[test]
    fn test_name_from_path() {
        assert_eq!(name_from_path("/a/b/c/SECRET"), "SECRET");
        assert_eq!(name_from_path("SECRET"), "SECRET");
        assert_eq!(name_from_path(""), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["/a/", "/b", "", "c"]), "/a/b/c");
        assert_eq!(join_path(&["a", "b"]), "a/b");
    }
}
