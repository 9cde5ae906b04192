//! Connect-protocol JSON client for the secrets service.
//!
//! Every RPC is a `POST {host}/priv.secrets.v1alpha1.SecretsService/{Method}`
//! with a JSON body in protobuf's JSON mapping: camelCase fields, `bytes`
//! as standard base64. Failures come back as a non-2xx status with a
//! `{"code", "message"}` body.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroize;

use super::{Action, DeleteSecret, PatchSecret, Secret, SecretsApi};
use crate::core::runtime::Blocking;
use crate::error::{ProviderError, Result, StoreError};

const SERVICE: &str = "priv.secrets.v1alpha1.SecretsService";

/// HTTP client for the secrets service.
pub struct ConnectClient {
    http: Client,
    host: String,
    access_token: String,
    runtime: Blocking,
}

impl ConnectClient {
    pub fn new(host: &str, access_token: &str, timeout: Option<Duration>) -> Result<Self> {
        let runtime = Blocking::new(timeout).map_err(|e| StoreError::Runtime(e.to_string()))?;
        Ok(Self {
            http: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            runtime,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}/{}", self.host, SERVICE, method)
    }

    fn call<Req, Resp>(&self, method: &'static str, body: &Req) -> std::result::Result<Resp, ProviderError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = self.url(method);
        debug!(method, "POST {}", url);

        self.runtime.run(method, async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.access_token)
                .header("Connect-Protocol-Version", "1")
                .json(body)
                .send()
                .await
                .map_err(|e| ProviderError::transport(method, e.to_string()))?;

            let status = response.status();
            trace!(method, status = status.as_u16(), "response received");

            if !status.is_success() {
                let err: ConnectError = response.json().await.unwrap_or_default();
                let code = err.code.unwrap_or_else(|| status.as_str().to_string());
                let message = err
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
                return Err(ProviderError::new(method, Some(code), message));
            }

            response
                .json::<Resp>()
                .await
                .map_err(|e| ProviderError::transport(method, format!("invalid response: {}", e)))
        })
    }
}

impl Drop for ConnectClient {
    fn drop(&mut self) {
        self.access_token.zeroize();
    }
}

impl SecretsApi for ConnectClient {
    fn list_secrets(&self, project_id: &str) -> std::result::Result<Vec<Secret>, ProviderError> {
        let response: ListSecretsResponse = self.call(
            "ListSecrets",
            &ListSecretsRequest {
                project_id: project_id.to_string(),
            },
        )?;
        response
            .secrets
            .into_iter()
            .map(|s| s.decode("ListSecrets"))
            .collect()
    }

    fn patch_secret(&self, request: PatchSecret) -> std::result::Result<(), ProviderError> {
        let _: Empty = self.call("PatchSecret", &WirePatch::from(request))?;
        Ok(())
    }

    fn delete_secret(&self, request: DeleteSecret) -> std::result::Result<(), ProviderError> {
        let _: Empty = self.call("DeleteSecret", &WireDelete::from(request))?;
        Ok(())
    }

    fn batch(&self, actions: Vec<Action>) -> std::result::Result<(), ProviderError> {
        let body = BatchRequest {
            actions: actions.into_iter().map(WireAction::from).collect(),
        };
        let _: Empty = self.call("Batch", &body)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConnectError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSecretsRequest {
    project_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListSecretsResponse {
    #[serde(default)]
    secrets: Vec<WireSecret>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSecret {
    #[serde(default)]
    name: String,
    /// Environment name to base64 value
    #[serde(default)]
    environment_values: BTreeMap<String, String>,
}

impl WireSecret {
    fn decode(self, method: &'static str) -> std::result::Result<Secret, ProviderError> {
        let mut environment_values = BTreeMap::new();
        for (env, encoded) in self.environment_values {
            let bytes = STANDARD.decode(encoded).map_err(|e| {
                ProviderError::transport(method, format!("invalid value of {}: {}", self.name, e))
            })?;
            environment_values.insert(env, bytes);
        }
        Ok(Secret {
            name: self.name,
            environment_values,
        })
    }
}

impl From<Secret> for WireSecret {
    fn from(secret: Secret) -> Self {
        Self {
            name: secret.name,
            environment_values: secret
                .environment_values
                .into_iter()
                .map(|(env, value)| (env, STANDARD.encode(value)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePatch {
    project_id: String,
    secret: WireSecret,
}

impl From<PatchSecret> for WirePatch {
    fn from(req: PatchSecret) -> Self {
        Self {
            project_id: req.project_id,
            secret: req.secret.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDelete {
    project_id: String,
    secret_name: String,
    environments: Vec<String>,
}

impl From<DeleteSecret> for WireDelete {
    fn from(req: DeleteSecret) -> Self {
        Self {
            project_id: req.project_id,
            secret_name: req.secret_name,
            environments: req.environments,
        }
    }
}

/// A oneof in protobuf JSON is an object with exactly one field set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum WireAction {
    PatchSecret(WirePatch),
    DeleteSecret(WireDelete),
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Patch(req) => Self::PatchSecret(req.into()),
            Action::Delete(req) => Self::DeleteSecret(req.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest {
    actions: Vec<WireAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_wire_format() {
        let patch = PatchSecret {
            project_id: "proj_1".to_string(),
            secret: Secret {
                name: "API_KEY".to_string(),
                environment_values: BTreeMap::from([("dev".to_string(), b"hi".to_vec())]),
            },
        };
        let value = serde_json::to_value(WirePatch::from(patch)).unwrap();
        assert_eq!(
            value,
            json!({
                "projectId": "proj_1",
                "secret": { "name": "API_KEY", "environmentValues": { "dev": "aGk=" } }
            })
        );
    }

    #[test]
    fn test_batch_actions_are_oneofs() {
        let body = BatchRequest {
            actions: vec![WireAction::from(Action::Delete(DeleteSecret {
                project_id: "p".to_string(),
                secret_name: "K".to_string(),
                environments: vec!["prod".to_string()],
            }))],
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            json!({
                "actions": [
                    { "deleteSecret": { "projectId": "p", "secretName": "K", "environments": ["prod"] } }
                ]
            })
        );
    }

    #[test]
    fn test_list_response_decodes_values() {
        let response: ListSecretsResponse = serde_json::from_value(json!({
            "secrets": [
                { "name": "A", "environmentValues": { "dev": "eA==" } },
                { "name": "B" }
            ]
        }))
        .unwrap();
        let secrets: Vec<Secret> = response
            .secrets
            .into_iter()
            .map(|s| s.decode("ListSecrets").unwrap())
            .collect();
        assert_eq!(secrets[0].environment_values["dev"], b"x".to_vec());
        assert!(secrets[1].environment_values.is_empty());
    }

    #[test]
    fn test_invalid_base64_is_provider_error() {
        let secret = WireSecret {
            name: "A".to_string(),
            environment_values: BTreeMap::from([("dev".to_string(), "%%%".to_string())]),
        };
        let err = secret.decode("ListSecrets").unwrap_err();
        assert_eq!(err.operation, "ListSecrets");
        assert!(err.message.contains("invalid value of A"));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = ConnectClient::new("https://api.example.com/", "tok", None).unwrap();
        assert_eq!(
            client.url("ListSecrets"),
            "https://api.example.com/priv.secrets.v1alpha1.SecretsService/ListSecrets"
        );
    }
}
