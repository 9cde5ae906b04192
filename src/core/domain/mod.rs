//! Domain types.

mod env_id;
mod secret;
mod token;

pub use env_id::EnvironmentId;
pub use secret::SecretEntry;
pub use token::{IdClaims, Token};
