//! envsec - Store and retrieve environment secrets.
//!
//! Secrets are namespaced by organization, project and environment and
//! live in AWS Systems Manager Parameter Store or a remote secrets API.
//! A login token is exchanged for short-lived AWS credentials through a
//! Cognito identity pool, with the result cached on disk.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/                # Command-line interface
//! │   ├── commands        # ls, get, set, rm
//! │   └── output          # Terminal output helpers
//! ├── core/               # Core library components
//! │   ├── config          # .envsec.toml and environment settings
//! │   ├── domain/         # EnvironmentId, SecretEntry, Token
//! │   ├── envsec          # Validating context over one store
//! │   ├── validation      # Names, values, NAME=VALUE arguments
//! │   ├── collate         # Natural name ordering
//! │   ├── cache           # TTL file cache
//! │   ├── federation/     # Token to AWS credentials
//! │   │   └── cognito     # Cognito identity pool
//! │   └── store/          # Store trait and backends
//! │       ├── addressing  # Path and tag addressing
//! │       ├── ssm/        # Parameter Store (api, aws)
//! │       └── remote/     # Remote secrets API (http)
//! └── error               # Error types
//! ```
//!
//! # Features
//!
//! - `aws` (default): the AWS SDK clients for Parameter Store and Cognito
//! - `test-aws`: integration tests against a live account

pub mod cli;
pub mod core;
pub mod error;
