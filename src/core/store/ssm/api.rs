//! Parameter Store API surface.
//!
//! The subset of SSM the store needs, as a trait so the batching and
//! pagination logic can run against an in-memory fake.

use crate::core::store::addressing::{ParameterFilter, Tag};
use crate::error::ProviderError;

/// Error code SSM returns when creating a parameter that exists.
pub const PARAMETER_ALREADY_EXISTS: &str = "ParameterAlreadyExists";

/// Error code SSM returns when the caller may not touch a parameter.
pub const ACCESS_DENIED: &str = "AccessDeniedException";

/// A put request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParameter {
    pub name: String,
    /// Already mapped through the empty-string placeholder
    pub value: String,
    /// Only sent on create; SSM rejects tags together with overwrite.
    pub tags: Vec<Tag>,
    pub kms_key_id: Option<String>,
    pub overwrite: bool,
}

/// A decrypted parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    pub name: String,
    pub value: String,
}

/// Parameter metadata from a describe query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    pub name: String,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Result of a batched get.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParametersOutput {
    pub parameters: Vec<ParameterValue>,
    /// Names the provider did not find
    pub invalid_parameters: Vec<String>,
}

/// Result of a batched delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteParametersOutput {
    pub deleted_parameters: Vec<String>,
    pub invalid_parameters: Vec<String>,
}

/// Parameter Store operations.
///
/// Batched calls accept at most ten names. Values are returned decrypted.
pub trait ParameterApi {
    fn put_parameter(&self, input: PutParameter) -> Result<(), ProviderError>;

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<Page<ParameterValue>, ProviderError>;

    fn describe_parameters(
        &self,
        filters: &[ParameterFilter],
        next_token: Option<String>,
    ) -> Result<Page<ParameterMetadata>, ProviderError>;

    fn get_parameters(&self, names: &[String]) -> Result<GetParametersOutput, ProviderError>;

    fn delete_parameters(&self, names: &[String])
        -> Result<DeleteParametersOutput, ProviderError>;

    /// Tags attached to one parameter.
    fn list_tags(&self, name: &str) -> Result<Vec<Tag>, ProviderError>;
}

impl<A: ParameterApi + ?Sized> ParameterApi for Box<A> {
    fn put_parameter(&self, input: PutParameter) -> Result<(), ProviderError> {
        (**self).put_parameter(input)
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<Page<ParameterValue>, ProviderError> {
        (**self).get_parameters_by_path(path, next_token)
    }

    fn describe_parameters(
        &self,
        filters: &[ParameterFilter],
        next_token: Option<String>,
    ) -> Result<Page<ParameterMetadata>, ProviderError> {
        (**self).describe_parameters(filters, next_token)
    }

    fn get_parameters(&self, names: &[String]) -> Result<GetParametersOutput, ProviderError> {
        (**self).get_parameters(names)
    }

    fn delete_parameters(
        &self,
        names: &[String],
    ) -> Result<DeleteParametersOutput, ProviderError> {
        (**self).delete_parameters(names)
    }

    fn list_tags(&self, name: &str) -> Result<Vec<Tag>, ProviderError> {
        (**self).list_tags(name)
    }
}

impl<A: ParameterApi + ?Sized> ParameterApi for &A {
    fn put_parameter(&self, input: PutParameter) -> Result<(), ProviderError> {
        (**self).put_parameter(input)
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<Page<ParameterValue>, ProviderError> {
        (**self).get_parameters_by_path(path, next_token)
    }

    fn describe_parameters(
        &self,
        filters: &[ParameterFilter],
        next_token: Option<String>,
    ) -> Result<Page<ParameterMetadata>, ProviderError> {
        (**self).describe_parameters(filters, next_token)
    }

    fn get_parameters(&self, names: &[String]) -> Result<GetParametersOutput, ProviderError> {
        (**self).get_parameters(names)
    }

    fn delete_parameters(
        &self,
        names: &[String],
    ) -> Result<DeleteParametersOutput, ProviderError> {
        (**self).delete_parameters(names)
    }

    fn list_tags(&self, name: &str) -> Result<Vec<Tag>, ProviderError> {
        (**self).list_tags(name)
    }
}
