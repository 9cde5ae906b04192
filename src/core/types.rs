//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A secret name (e.g., DATABASE_URL, API_KEY).
///
/// Must be a valid environment variable name.
pub type SecretName = String;

/// A plaintext secret value.
pub type SecretValue = String;

/// Identifier of a parameter at the provider (a full path for Parameter Store).
pub type ProviderId = String;
