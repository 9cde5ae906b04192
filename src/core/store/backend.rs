//! Backend selection.
//!
//! The backend is chosen once per invocation: `ENVSEC_STORE` wins over the
//! project's `[store] backend`, which defaults to Parameter Store.

use tracing::info;

use super::{RemoteStore, Store};
use crate::core::config::{Backend, Settings, StoreConfig};
use crate::core::domain::Token;
use crate::error::{ConfigError, Result};

/// Open the configured store.
///
/// For Parameter Store, a token is exchanged for federated credentials
/// first; without one the SDK's default credential chain applies. The
/// remote API always needs a token.
pub fn open_store(
    settings: &Settings,
    store: &StoreConfig,
    token: Option<&Token>,
) -> Result<Box<dyn Store>> {
    match settings.backend_for(store) {
        Backend::Api => {
            let token = token.ok_or(ConfigError::MissingToken)?;
            info!(host = %settings.api_host, "using remote secrets API");
            let remote = RemoteStore::connect(&settings.api_host, token, store.timeout())?;
            Ok(Box::new(remote))
        }
        Backend::Ssm => open_ssm(settings, store, token),
    }
}

#[cfg(feature = "aws")]
fn open_ssm(settings: &Settings, store: &StoreConfig, token: Option<&Token>) -> Result<Box<dyn Store>> {
    use super::ssm::{SsmConfig, SsmStore};
    use crate::core::federation::{Federation, FederationSettings};

    let mut config = SsmConfig::from_store_config(store);
    if let Some(token) = token {
        let federation =
            Federation::connect(FederationSettings::from_settings(settings), store.timeout())?;
        let credentials = federation.exchange(token)?;
        let region = store
            .region
            .clone()
            .unwrap_or_else(|| federation.settings().region.clone());
        config = config.with_credentials(credentials, region);
        info!("using Parameter Store with federated credentials");
    } else {
        info!("using Parameter Store with default AWS credentials");
    }
    Ok(Box::new(SsmStore::connect(config)?))
}

#[cfg(not(feature = "aws"))]
fn open_ssm(
    _settings: &Settings,
    _store: &StoreConfig,
    _token: Option<&Token>,
) -> Result<Box<dyn Store>> {
    Err(crate::error::StoreError::BackendNotCompiled("aws").into())
}
