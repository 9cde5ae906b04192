//! [`IdentityPool`] over the Cognito Identity SDK.
//!
//! Both calls are unauthenticated; the id token in `logins` is the proof.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_cognitoidentity::config::Region;
use aws_sdk_cognitoidentity::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentity::Client;
use chrono::DateTime;
use tracing::trace;

use super::{Credentials, IdentityPool};
use crate::core::runtime::Blocking;
use crate::error::{FederationError, ProviderError, Result};

pub struct CognitoIdentityPool {
    client: Client,
    runtime: Blocking,
}

impl CognitoIdentityPool {
    pub fn new(region: &str, timeout: Option<Duration>) -> Result<Self> {
        let runtime =
            Blocking::new(timeout).map_err(|e| FederationError::Runtime(e.to_string()))?;
        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );
        Ok(Self {
            client: Client::new(&sdk_config),
            runtime,
        })
    }
}

impl IdentityPool for CognitoIdentityPool {
    fn get_id(
        &self,
        account_id: &str,
        identity_pool_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<String> {
        const OP: &str = "GetId";

        let output = self.runtime.run(OP, async {
            self.client
                .get_id()
                .account_id(account_id)
                .identity_pool_id(identity_pool_id)
                .logins(provider, id_token)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))
        })
        .map_err(FederationError::from)?;

        let identity_id = output
            .identity_id()
            .ok_or(FederationError::MissingField("identity id"))?;
        trace!(identity_id, "resolved identity");
        Ok(identity_id.to_string())
    }

    fn get_credentials(
        &self,
        identity_id: &str,
        provider: &str,
        id_token: &str,
    ) -> Result<Credentials> {
        const OP: &str = "GetCredentialsForIdentity";

        let output = self.runtime.run(OP, async {
            self.client
                .get_credentials_for_identity()
                .identity_id(identity_id)
                .logins(provider, id_token)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))
        })
        .map_err(FederationError::from)?;

        let creds = output
            .credentials()
            .ok_or(FederationError::MissingField("credentials"))?;
        let expiration = creds
            .expiration()
            .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()))
            .ok_or(FederationError::MissingField("expiration"))?;

        Ok(Credentials {
            access_key_id: creds
                .access_key_id()
                .ok_or(FederationError::MissingField("access key id"))?
                .to_string(),
            secret_access_key: creds
                .secret_key()
                .ok_or(FederationError::MissingField("secret key"))?
                .to_string(),
            session_token: creds
                .session_token()
                .ok_or(FederationError::MissingField("session token"))?
                .to_string(),
            expiration,
        })
    }
}

fn provider_error<E>(operation: &'static str, err: SdkError<E>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match &err {
        SdkError::ServiceError(ctx) => ProviderError::new(
            operation,
            ctx.err().code().map(str::to_string),
            ctx.err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
        ),
        _ => ProviderError::transport(operation, DisplayErrorContext(&err).to_string()),
    }
}
