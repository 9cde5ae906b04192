//! [`ParameterApi`] over the AWS SDK.
//!
//! Enable with `--features aws` (on by default). Credentials come from the
//! federated [`Credentials`](crate::core::federation::Credentials) when
//! present, otherwise from the SDK's default provider chain
//! (`AWS_ACCESS_KEY_ID`, profiles, instance roles).

use std::time::SystemTime;

use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::{Credentials, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::types::{
    ParameterStringFilter, ParameterType, ResourceTypeForTagging, Tag as SdkTag,
};
use aws_sdk_ssm::Client;
use tracing::trace;

use super::api::{
    DeleteParametersOutput, GetParametersOutput, Page, ParameterApi, ParameterMetadata,
    ParameterValue, PutParameter,
};
use super::SsmConfig;
use crate::core::runtime::Blocking;
use crate::core::store::addressing::{ParameterFilter, Tag};
use crate::error::{ProviderError, Result, StoreError};

/// Parameter Store client driven on a private runtime.
pub struct SdkParameterApi {
    client: Client,
    runtime: Blocking,
}

impl SdkParameterApi {
    pub fn new(config: &SsmConfig) -> Result<Self> {
        let runtime =
            Blocking::new(config.timeout).map_err(|e| StoreError::Runtime(e.to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                Some(creds.session_token.clone()),
                Some(SystemTime::from(creds.expiration)),
                "envsec-federation",
            ));
        }
        if let Some(url) = &config.endpoint_url {
            loader = loader.endpoint_url(url.clone());
        }

        let sdk_config = runtime.block_on(loader.load());
        trace!(region = ?sdk_config.region(), "loaded SSM client config");

        Ok(Self {
            client: Client::new(&sdk_config),
            runtime,
        })
    }
}

impl ParameterApi for SdkParameterApi {
    fn put_parameter(&self, input: PutParameter) -> std::result::Result<(), ProviderError> {
        const OP: &str = "PutParameter";

        let mut tags = Vec::with_capacity(input.tags.len());
        for tag in &input.tags {
            let built = SdkTag::builder()
                .key(&tag.key)
                .value(&tag.value)
                .build()
                .map_err(|e| ProviderError::transport(OP, e.to_string()))?;
            tags.push(built);
        }

        self.runtime.run(OP, async {
            let mut request = self
                .client
                .put_parameter()
                .name(&input.name)
                .value(&input.value)
                .r#type(ParameterType::SecureString)
                .overwrite(input.overwrite)
                .set_key_id(input.kms_key_id.clone());
            if !tags.is_empty() {
                request = request.set_tags(Some(tags));
            }
            request
                .send()
                .await
                .map(|_| ())
                .map_err(|e| provider_error(OP, e))
        })
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> std::result::Result<Page<ParameterValue>, ProviderError> {
        const OP: &str = "GetParametersByPath";

        self.runtime.run(OP, async {
            let output = self
                .client
                .get_parameters_by_path()
                .path(path)
                .recursive(true)
                .with_decryption(true)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))?;

            Ok(Page {
                items: output.parameters().iter().filter_map(to_value).collect(),
                next_token: output.next_token().map(str::to_string),
            })
        })
    }

    fn describe_parameters(
        &self,
        filters: &[ParameterFilter],
        next_token: Option<String>,
    ) -> std::result::Result<Page<ParameterMetadata>, ProviderError> {
        const OP: &str = "DescribeParameters";

        let mut sdk_filters = Vec::with_capacity(filters.len());
        for f in filters {
            let built = ParameterStringFilter::builder()
                .key(&f.key)
                .set_option(f.option.clone())
                .set_values(Some(f.values.clone()))
                .build()
                .map_err(|e| ProviderError::transport(OP, e.to_string()))?;
            sdk_filters.push(built);
        }

        self.runtime.run(OP, async {
            let output = self
                .client
                .describe_parameters()
                .set_parameter_filters(Some(sdk_filters))
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))?;

            let items = output
                .parameters()
                .iter()
                .filter_map(|p| {
                    Some(ParameterMetadata {
                        name: p.name()?.to_string(),
                    })
                })
                .collect();

            Ok(Page {
                items,
                next_token: output.next_token().map(str::to_string),
            })
        })
    }

    fn get_parameters(
        &self,
        names: &[String],
    ) -> std::result::Result<GetParametersOutput, ProviderError> {
        const OP: &str = "GetParameters";

        self.runtime.run(OP, async {
            let output = self
                .client
                .get_parameters()
                .set_names(Some(names.to_vec()))
                .with_decryption(true)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))?;

            Ok(GetParametersOutput {
                parameters: output.parameters().iter().filter_map(to_value).collect(),
                invalid_parameters: output.invalid_parameters().to_vec(),
            })
        })
    }

    fn delete_parameters(
        &self,
        names: &[String],
    ) -> std::result::Result<DeleteParametersOutput, ProviderError> {
        const OP: &str = "DeleteParameters";

        self.runtime.run(OP, async {
            let output = self
                .client
                .delete_parameters()
                .set_names(Some(names.to_vec()))
                .send()
                .await
                .map_err(|e| provider_error(OP, e))?;

            Ok(DeleteParametersOutput {
                deleted_parameters: output.deleted_parameters().to_vec(),
                invalid_parameters: output.invalid_parameters().to_vec(),
            })
        })
    }

    fn list_tags(&self, name: &str) -> std::result::Result<Vec<Tag>, ProviderError> {
        const OP: &str = "ListTagsForResource";

        self.runtime.run(OP, async {
            let output = self
                .client
                .list_tags_for_resource()
                .resource_type(ResourceTypeForTagging::Parameter)
                .resource_id(name)
                .send()
                .await
                .map_err(|e| provider_error(OP, e))?;

            Ok(output
                .tag_list()
                .iter()
                .map(|t| Tag::new(t.key(), t.value()))
                .collect())
        })
    }
}

fn to_value(p: &aws_sdk_ssm::types::Parameter) -> Option<ParameterValue> {
    Some(ParameterValue {
        name: p.name()?.to_string(),
        value: p.value()?.to_string(),
    })
}

/// Keep the service's error code so callers can match on it.
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
