//! Credential federation.
//!
//! Exchanges the login flow's OIDC id token for short-lived AWS credentials
//! through a Cognito identity pool:
//!
//! 1. `GetId` resolves the identity for the token.
//! 2. `GetCredentialsForIdentity` issues credentials for that identity.
//!
//! Results are cached on disk until the credentials expire, keyed by the
//! token's organization (or a hash of the token when it has none), so
//! repeated invocations skip both calls.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::core::cache::FileCache;
use crate::core::config::Settings;
use crate::core::constants::{FEDERATION_CACHE_KEY_PREFIX, LEGACY_AUTH_DOMAIN};
use crate::core::domain::Token;
use crate::error::Result;

#[cfg(feature = "aws")]
pub mod cognito;

const DEFAULT_ACCOUNT_ID: &str = "984256416385";
const DEFAULT_IDENTITY_POOL_ID: &str = "us-west-2:8111c156-085b-4ac5-b94d-f823205f6261";
const DEFAULT_REGION: &str = "us-west-2";

/// Identity pool coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationSettings {
    pub account_id: String,
    pub identity_pool_id: String,
    pub region: String,
    /// Login provider for tokens from the current issuer
    pub provider: String,
    /// Login provider for tokens from the legacy issuer
    pub legacy_provider: String,
}

impl Default for FederationSettings {
    fn default() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            identity_pool_id: DEFAULT_IDENTITY_POOL_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            provider: crate::core::constants::DEFAULT_AUTH_DOMAIN.to_string(),
            legacy_provider: LEGACY_AUTH_DOMAIN.to_string(),
        }
    }
}

impl FederationSettings {
    /// Defaults with the auth domain taken from the environment.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            provider: settings.auth_domain.clone(),
            ..Self::default()
        }
    }

    /// Login provider for `token`.
    ///
    /// Tokens issued by `https://<legacy_provider>/` log in through the
    /// legacy provider; everything else, including tokens whose claims
    /// can't be read, uses the current one.
    pub fn provider_for(&self, token: &Token) -> &str {
        let legacy_issuer = format!("https://{}/", self.legacy_provider);
        match token.id_claims() {
            Some(claims) if claims.issuer == legacy_issuer => &self.legacy_provider,
            _ => &self.provider,
        }
    }
}

/// Temporary AWS credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.secret_access_key.zeroize();
        self.session_token.zeroize();
    }
}

/// Cognito identity pool operations.
pub trait IdentityPool {
    /// Identity id for an id token presented through `provider`.
    fn get_id(
        &self,
        account_id: &str,
        identity_pool_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<String>;

    /// Credentials for a previously resolved identity.
    fn get_credentials(&self, identity_id: &str, provider: &str, id_token: &str)
        -> Result<Credentials>;
}

impl<P: IdentityPool + ?Sized> IdentityPool for Box<P> {
    fn get_id(
        &self,
        account_id: &str,
        identity_pool_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<String> {
        (**self).get_id(account_id, identity_pool_id, provider, id_token)
    }

    fn get_credentials(
        &self,
        identity_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<Credentials> {
        (**self).get_credentials(identity_id, provider, id_token)
    }
}

impl<P: IdentityPool + ?Sized> IdentityPool for &P {
    fn get_id(
        &self,
        account_id: &str,
        identity_pool_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<String> {
        (**self).get_id(account_id, identity_pool_id, provider, id_token)
    }

    fn get_credentials(
        &self,
        identity_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<Credentials> {
        (**self).get_credentials(identity_id, provider, id_token)
    }
}

/// Token-for-credentials exchange with an optional disk cache.
pub struct Federation<P = Box<dyn IdentityPool>> {
    settings: FederationSettings,
    pool: P,
    cache: Option<FileCache>,
}

#[cfg(feature = "aws")]
impl Federation {
    /// Federation against the real identity pool, cached under the user's
    /// cache directory when one exists.
    pub fn connect(settings: FederationSettings, timeout: Option<std::time::Duration>) -> Result<Self> {
        use crate::core::constants::{CACHE_APP, FEDERATION_CACHE_DOMAIN};

        let pool = cognito::CognitoIdentityPool::new(&settings.region, timeout)?;
        let cache = match FileCache::new(CACHE_APP, FEDERATION_CACHE_DOMAIN) {
            Ok(cache) => Some(cache),
            Err(e) => {
                debug!(error = %e, "credential cache disabled");
                None
            }
        };
        Ok(Self::new(settings, Box::new(pool), cache))
    }
}

impl<P: IdentityPool> Federation<P> {
    pub fn new(settings: FederationSettings, pool: P, cache: Option<FileCache>) -> Self {
        Self {
            settings,
            pool,
            cache,
        }
    }

    pub fn settings(&self) -> &FederationSettings {
        &self.settings
    }

    /// Credentials for `token`, from cache when still valid.
    ///
    /// A failed cache write is logged and otherwise ignored.
    pub fn exchange(&self, token: &Token) -> Result<Credentials> {
        let key = cache_key(token);

        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let provider = self.settings.provider_for(token);
        debug!(provider, "exchanging id token for credentials");

        let identity_id = self.pool.get_id(
            &self.settings.account_id,
            &self.settings.identity_pool_id,
            provider,
            &token.id_token,
        )?;
        let creds = self
            .pool
            .get_credentials(&identity_id, provider, &token.id_token)?;

        if let Some(cache) = &self.cache {
            let stored = serde_json::to_vec(&creds)
                .map_err(crate::error::FederationError::from)
                .map_err(crate::error::Error::from)
                .and_then(|bytes| cache.set_until(&key, &bytes, creds.expiration));
            if let Err(e) = stored {
                warn!(key = %key, error = %e, "failed to cache credentials");
            }
        }

        Ok(creds)
    }

    fn cached(&self, key: &str) -> Option<Credentials> {
        let cache = self.cache.as_ref()?;
        let bytes = match cache.get(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(key, error = %e, "no cached credentials");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(creds) => {
                debug!(key, "using cached credentials");
                Some(creds)
            }
            Err(e) => {
                debug!(key, error = %e, "ignoring unreadable cached credentials");
                None
            }
        }
    }
}

/// Cache key for a token's credentials.
///
/// `awsfed-<org_id>` when the token names an organization, otherwise
/// `awsfed-<sha256 hex of the id token>`.
pub fn cache_key(token: &Token) -> String {
    match token.org_id() {
        Some(org) => format!("{}-{}", FEDERATION_CACHE_KEY_PREFIX, org),
        None => {
            let digest = Sha256::digest(token.id_token.as_bytes());
            let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{}-{}", FEDERATION_CACHE_KEY_PREFIX, hex)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn jwt(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_cache_key_uses_org() {
        let token = Token::new("a", jwt(r#"{"org_id":"org_9"}"#));
        assert_eq!(cache_key(&token), "awsfed-org_9");
    }

    #[test]
    fn test_cache_key_hashes_token_without_org() {
        let token = Token::new("a", "not-a-jwt");
        let key = cache_key(&token);
        assert!(key.starts_with("awsfed-"));
        assert_eq!(key.len(), "awsfed-".len() + 64);
        assert_eq!(key, cache_key(&Token::new("b", "not-a-jwt")));
    }

    #[test]
    fn test_provider_selection() {
        let settings = FederationSettings::default();

        let legacy = Token::new("a", jwt(r#"{"iss":"https://auth.jetpack.io/"}"#));
        assert_eq!(settings.provider_for(&legacy), "auth.jetpack.io");

        let current = Token::new("a", jwt(r#"{"iss":"https://accounts.jetpack.io/"}"#));
        assert_eq!(settings.provider_for(&current), "accounts.jetpack.io");

        let opaque = Token::new("a", "opaque");
        assert_eq!(settings.provider_for(&opaque), "accounts.jetpack.io");
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: "tok-123".to_string(),
            expiration: Utc::now(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("tok-123"));
    }
}
