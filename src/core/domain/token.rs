//! Identity token handed over by the login flow.
//!
//! Only the claims are read here. Signature verification happens when the
//! token is issued; federation presents the raw id token to the identity
//! pool, which verifies it again.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

const JWT_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried by an OIDC id token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdClaims {
    #[serde(default, rename = "sub")]
    pub subject: String,
    #[serde(default, rename = "iss")]
    pub issuer: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// An authenticated session.
#[derive(Clone)]
pub struct Token {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    claims: Option<IdClaims>,
}

impl Token {
    /// Build a token, decoding the id token's claims.
    ///
    /// An id token whose payload can't be decoded yields a token without
    /// claims rather than an error.
    pub fn new(access_token: impl Into<String>, id_token: impl Into<String>) -> Self {
        let id_token = id_token.into();
        let claims = decode_claims(&id_token);
        Self {
            access_token: access_token.into(),
            id_token,
            refresh_token: None,
            claims,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn id_claims(&self) -> Option<&IdClaims> {
        self.claims.as_ref()
    }

    /// Organization the token was issued for, if any.
    pub fn org_id(&self) -> Option<&str> {
        self.claims
            .as_ref()
            .map(|c| c.org_id.as_str())
            .filter(|org| !org.is_empty())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.access_token.zeroize();
        self.id_token.zeroize();
        if let Some(refresh) = self.refresh_token.as_mut() {
            refresh.zeroize();
        }
    }
}

fn decode_claims(id_token: &str) -> Option<IdClaims> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = match JWT_PAYLOAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "id token payload is not base64url");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "id token payload is not a claims object");
            None
        }
    }
}
