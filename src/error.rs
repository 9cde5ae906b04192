//! Error types.
//!
//! One top-level [`Error`] with a variant per domain. Each domain error is
//! its own enum so callers can match on the kind instead of the message.

use std::fmt;

use thiserror::Error;

/// Top-level error for every envsec operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Federation(#[from] FederationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the parameter a delete was refused for, if this error (or any
    /// error aggregated inside it) is a [`StoreError::FaultyParameter`].
    pub fn faulty_parameter(&self) -> Option<&str> {
        match self {
            Error::Store(StoreError::FaultyParameter(name)) => Some(name.as_str()),
            Error::Store(StoreError::Aggregate(agg)) => {
                agg.errors().iter().find_map(Error::faulty_parameter)
            }
            Error::Store(StoreError::Chunk { source, .. }) => source.faulty_parameter(),
            _ => None,
        }
    }

    /// The aggregate behind this error, when a batch partially failed.
    pub fn as_aggregate(&self) -> Option<&AggregateError> {
        match self {
            Error::Store(StoreError::Aggregate(agg)) => Some(agg),
            _ => None,
        }
    }

    /// Whether the error was raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Error::Store(StoreError::Provider(err))
    }
}

/// Input rejected before reaching a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("name {name} must match the regular expression: {pattern}")]
    InvalidName { name: String, pattern: &'static str },

    #[error("name {0} cannot start with JETPACK_ (or lowercase)")]
    ReservedPrefix(String),

    #[error("value for {name} is {size} bytes; parameter values are limited in size to {max} bytes")]
    ValueTooLarge {
        name: String,
        size: usize,
        max: usize,
    },

    #[error("argument {0} must have an '=' to be of the form NAME=VALUE")]
    MalformedSetArg(String),

    #[error(
        "@ syntax is used for setting a secret from a file. file {file} does not exist. \
         If your value starts with @, escape it with a backslash, e.g. {name}='\\@{file}'"
    )]
    MissingValueFile { name: String, file: String },

    #[error("project id cannot be empty")]
    EmptyProjectId,
}

/// A failure reported by a provider API.
///
/// Keeps the provider's own error code so callers can tell access-denied
/// from throttling without parsing the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub operation: &'static str,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Error with no provider code (transport, timeout, decoding).
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, None, message)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

/// Errors raised by a [`Store`](crate::core::store::Store) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The provider refused to delete this parameter, usually for lack of
    /// permission.
    #[error("could not delete {0}: Faulty Parameter")]
    FaultyParameter(String),

    /// One provider batch failed; names lists every secret in that batch.
    #[error("failed to {action} {}: {source}", .names.join(", "))]
    Chunk {
        action: &'static str,
        names: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Aggregate(AggregateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("unknown store backend: {0}. Supported: ssm, api")]
    UnknownBackend(String),

    #[error("{0} support not compiled. Rebuild with: cargo install envsec --features {0}")]
    BackendNotCompiled(&'static str),

    #[error("failed to start async runtime: {0}")]
    Runtime(String),

    #[error("unexpected response from {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },
}

/// Several independent failures collected from one batch operation.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    /// Every constituent error, in the order they occurred.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as an error.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Aggregate(self).into())
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {} occurred:", self.errors.len(), noun)?;
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Local cache lookups and writes.
///
/// `NotFound` and `Expired` are both plain misses; they are reported
/// separately so tests and logs can tell them apart.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache entry not found: {0}")]
    NotFound(String),

    #[error("cache entry expired: {0}")]
    Expired(String),

    #[error("unable to determine user cache directory")]
    NoCacheDir,

    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    #[error("failed to access cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

impl CacheError {
    /// True for the two expected miss states.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

/// Exchanging an identity token for storage credentials.
#[derive(Error, Debug)]
pub enum FederationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("identity pool returned no {0}")]
    MissingField(&'static str),

    #[error("failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(String),
}

/// Project configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not initialized: no .envsec.toml in this directory")]
    NotInitialized,

    #[error("failed to read config: {0}")]
    ReadFile(std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("not logged in: set ENVSEC_ID_TOKEN or configure AWS credentials")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, Error>;
