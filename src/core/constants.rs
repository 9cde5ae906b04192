//! Constants used throughout envsec.
//!
//! Centralizes magic strings and provider limits.

/// Project configuration file name (.envsec.toml).
pub const CONFIG_FILE: &str = ".envsec.toml";

/// Root of every path-addressed parameter.
pub const PATH_PREFIX: &str = "/jetpack-data/env";

/// Names starting with this prefix (any case) are reserved for internal use.
pub const RESERVED_PREFIX: &str = "jetpack_";

/// Pattern every secret name must match.
pub const NAME_PATTERN: &str = "^[a-zA-Z_][a-zA-Z0-9_]*";

/// Parameter Store caps a single value at 4KB.
pub const PARAMETER_VALUE_MAX_LEN: usize = 4 * 1024;

/// Parameter Store accepts at most this many names per batched call.
pub const PARAMETER_BATCH_LIMIT: usize = 10;

/// SecureString parameters cannot hold "", so it is stored as this.
pub const EMPTY_STRING_PLACEHOLDER: &str = "__###EMPTY_STRING###__";

/// Tag keys attached to every parameter.
pub const TAG_ORG_ID: &str = "org-id";
pub const TAG_PROJECT_ID: &str = "project-id";
pub const TAG_ENV_NAME: &str = "env-name";
pub const TAG_NAME: &str = "name";

/// Per-application directory under the user cache dir.
pub const CACHE_APP: &str = "envsec";

/// Cache domain holding federated credentials.
pub const FEDERATION_CACHE_DOMAIN: &str = "awsfed";

/// Prefix of federated credential cache keys.
pub const FEDERATION_CACHE_KEY_PREFIX: &str = "awsfed";

/// Default remote secrets API.
pub const DEFAULT_API_HOST: &str = "https://envsec-service-prod.cloud.jetpack.dev";

/// Identity provider issuing current tokens.
pub const DEFAULT_AUTH_DOMAIN: &str = "accounts.jetpack.io";

/// Identity provider that issued tokens before the migration.
pub const LEGACY_AUTH_DOMAIN: &str = "auth.jetpack.io";

/// Environment used when none is given.
pub const DEFAULT_ENV_NAME: &str = "dev";
