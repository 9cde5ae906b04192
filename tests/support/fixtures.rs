//! Test fixtures and constants.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use envsec::core::domain::EnvironmentId;

/// Standard secrets used across multiple tests.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "sk-test-12345"),
    ("JWT_SECRET", "super-secret-jwt-token"),
    ("REDIS_URL", "redis://localhost:6379"),
];

pub fn env_id() -> EnvironmentId {
    EnvironmentId::new("org_test", "proj_test", "dev").expect("valid environment")
}

/// An unsigned JWT carrying `claims` as its payload.
pub fn jwt(claims: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims)
    )
}

/// `n` distinct valid names: `VAR_00`, `VAR_01`, ...
pub fn var_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("VAR_{:02}", i)).collect()
}
