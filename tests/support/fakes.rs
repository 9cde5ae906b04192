//! In-memory fakes of the provider seams.
//!
//! Each fake counts its calls and can be told to fail specific ones, so
//! tests can assert on batching and partial-failure behavior.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use envsec::core::federation::{Credentials, IdentityPool};
use envsec::core::store::addressing::{ParameterFilter, Tag};
use envsec::core::store::remote::{Action, DeleteSecret, PatchSecret, Secret, SecretsApi};
use envsec::core::store::ssm::api::{
    DeleteParametersOutput, GetParametersOutput, Page, ParameterApi, ParameterMetadata,
    ParameterValue, PutParameter,
};
use envsec::error::ProviderError;

#[derive(Debug, Clone)]
struct StoredParameter {
    value: String,
    tags: Vec<Tag>,
}

/// Parameter Store fake with SSM's batch limit and error codes.
#[derive(Default)]
pub struct FakeSsm {
    params: RefCell<BTreeMap<String, StoredParameter>>,
    /// (operation, number of names or 1)
    calls: RefCell<Vec<(&'static str, usize)>>,
    /// (operation, zero-based call index) that fail with a throttling error
    failures: RefCell<HashSet<(&'static str, usize)>>,
    /// Parameter ids whose deletion is denied
    denied: RefCell<HashSet<String>>,
    page_size: Cell<usize>,
    puts: RefCell<Vec<PutParameter>>,
}

impl FakeSsm {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.page_size.set(10);
        fake
    }

    /// Page size of by-path and describe results.
    pub fn with_page_size(self, size: usize) -> Self {
        self.page_size.set(size);
        self
    }

    /// Make the `index`th call (zero-based) to `operation` fail.
    pub fn fail_call(&self, operation: &'static str, index: usize) {
        self.failures.borrow_mut().insert((operation, index));
    }

    /// Deny deletion of the parameter with this id.
    pub fn deny_delete(&self, id: &str) {
        self.denied.borrow_mut().insert(id.to_string());
    }

    /// Seed a parameter directly.
    pub fn insert(&self, id: &str, value: &str, tags: Vec<Tag>) {
        self.params.borrow_mut().insert(
            id.to_string(),
            StoredParameter {
                value: value.to_string(),
                tags,
            },
        );
    }

    /// Raw stored value, placeholder included.
    pub fn raw_value(&self, id: &str) -> Option<String> {
        self.params.borrow().get(id).map(|p| p.value.clone())
    }

    pub fn tags_of(&self, id: &str) -> Vec<Tag> {
        self.params
            .borrow()
            .get(id)
            .map(|p| p.tags.clone())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.params.borrow().keys().cloned().collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    /// Batch sizes of every call to `operation`, in order.
    pub fn batch_sizes(&self, operation: &str) -> Vec<usize> {
        self.calls
            .borrow()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, n)| *n)
            .collect()
    }

    pub fn puts(&self) -> Vec<PutParameter> {
        self.puts.borrow().clone()
    }

    fn record(&self, operation: &'static str, size: usize) -> Result<(), ProviderError> {
        let index = self.calls_to(operation);
        self.calls.borrow_mut().push((operation, size));
        if self.failures.borrow().contains(&(operation, index)) {
            return Err(ProviderError::new(
                operation,
                Some("ThrottlingException".to_string()),
                "Rate exceeded",
            ));
        }
        if size > 10 {
            return Err(ProviderError::new(
                operation,
                Some("ValidationException".to_string()),
                format!("{} names exceed the limit of 10", size),
            ));
        }
        Ok(())
    }

    fn page<T: Clone>(&self, items: Vec<T>, next_token: Option<String>) -> Page<T> {
        let start: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size.get()).min(items.len());
        Page {
            items: items[start..end].to_vec(),
            next_token: (end < items.len()).then(|| end.to_string()),
        }
    }
}

impl ParameterApi for FakeSsm {
    fn put_parameter(&self, input: PutParameter) -> Result<(), ProviderError> {
        self.record("PutParameter", 1)?;
        self.puts.borrow_mut().push(input.clone());

        let mut params = self.params.borrow_mut();
        match params.get_mut(&input.name) {
            Some(_) if !input.overwrite => Err(ProviderError::new(
                "PutParameter",
                Some("ParameterAlreadyExists".to_string()),
                "The parameter already exists.",
            )),
            Some(_) if !input.tags.is_empty() => Err(ProviderError::new(
                "PutParameter",
                Some("ValidationException".to_string()),
                "tags and overwrite can't be used together",
            )),
            Some(existing) => {
                existing.value = input.value;
                Ok(())
            }
            None => {
                params.insert(
                    input.name,
                    StoredParameter {
                        value: input.value,
                        tags: input.tags,
                    },
                );
                Ok(())
            }
        }
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<Page<ParameterValue>, ProviderError> {
        self.record("GetParametersByPath", 1)?;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let items: Vec<ParameterValue> = self
            .params
            .borrow()
            .iter()
            .filter(|(id, _)| id.starts_with(&prefix))
            .map(|(id, p)| ParameterValue {
                name: id.clone(),
                value: p.value.clone(),
            })
            .collect();
        Ok(self.page(items, next_token))
    }

    fn describe_parameters(
        &self,
        filters: &[ParameterFilter],
        next_token: Option<String>,
    ) -> Result<Page<ParameterMetadata>, ProviderError> {
        self.record("DescribeParameters", 1)?;
        let items: Vec<ParameterMetadata> = self
            .params
            .borrow()
            .iter()
            .filter(|(id, p)| filters.iter().all(|f| matches_filter(id, p, f)))
            .map(|(id, _)| ParameterMetadata { name: id.clone() })
            .collect();
        Ok(self.page(items, next_token))
    }

    fn get_parameters(&self, names: &[String]) -> Result<GetParametersOutput, ProviderError> {
        self.record("GetParameters", names.len())?;
        let params = self.params.borrow();
        let mut output = GetParametersOutput::default();
        for name in names {
            match params.get(name) {
                Some(p) => output.parameters.push(ParameterValue {
                    name: name.clone(),
                    value: p.value.clone(),
                }),
                None => output.invalid_parameters.push(name.clone()),
            }
        }
        Ok(output)
    }

    fn delete_parameters(&self, names: &[String]) -> Result<DeleteParametersOutput, ProviderError> {
        self.record("DeleteParameters", names.len())?;

        if let Some(denied) = names.iter().find(|n| self.denied.borrow().contains(*n)) {
            return Err(ProviderError::new(
                "DeleteParameters",
                Some("AccessDeniedException".to_string()),
                format!(
                    "User: arn:aws:sts::123456789012:assumed-role/envsec/session is not \
                     authorized to perform: ssm:DeleteParameters on resource: \
                     arn:aws:ssm:us-west-2:123456789012:parameter{} because no \
                     identity-based policy allows the ssm:DeleteParameters action",
                    denied
                ),
            ));
        }

        let mut params = self.params.borrow_mut();
        let mut output = DeleteParametersOutput::default();
        for name in names {
            if params.remove(name).is_some() {
                output.deleted_parameters.push(name.clone());
            } else {
                output.invalid_parameters.push(name.clone());
            }
        }
        Ok(output)
    }

    fn list_tags(&self, name: &str) -> Result<Vec<Tag>, ProviderError> {
        self.record("ListTagsForResource", 1)?;
        match self.params.borrow().get(name) {
            Some(p) => Ok(p.tags.clone()),
            None => Err(ProviderError::new(
                "ListTagsForResource",
                Some("InvalidResourceId".to_string()),
                format!("parameter {} not found", name),
            )),
        }
    }
}

fn matches_filter(id: &str, param: &StoredParameter, filter: &ParameterFilter) -> bool {
    if filter.key == "Path" {
        return filter
            .values
            .iter()
            .any(|root| id.starts_with(&format!("{}/", root.trim_end_matches('/'))));
    }
    match filter.key.strip_prefix("tag:") {
        Some(key) => param
            .tags
            .iter()
            .any(|t| t.key == key && filter.values.contains(&t.value)),
        None => false,
    }
}

/// Identity pool fake issuing credentials valid for `ttl`.
pub struct FakeIdentityPool {
    pub ttl: Duration,
    get_id_calls: Cell<usize>,
    credential_calls: Cell<usize>,
    providers: RefCell<Vec<String>>,
    fail: Cell<bool>,
}

impl FakeIdentityPool {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            get_id_calls: Cell::new(0),
            credential_calls: Cell::new(0),
            providers: RefCell::new(Vec::new()),
            fail: Cell::new(false),
        }
    }

    /// Make every following call fail.
    pub fn fail(&self) {
        self.fail.set(true);
    }

    /// Number of completed exchanges (GetCredentialsForIdentity calls).
    pub fn exchanges(&self) -> usize {
        self.credential_calls.get()
    }

    pub fn get_id_calls(&self) -> usize {
        self.get_id_calls.get()
    }

    /// Login providers presented, in order.
    pub fn providers(&self) -> Vec<String> {
        self.providers.borrow().clone()
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        Utc::now() + self.ttl
    }
}

impl IdentityPool for FakeIdentityPool {
    fn get_id(
        &self,
        _account_id: &str,
        _identity_pool_id: &str,
        provider: &str,
        _id_token: &str,
    ) -> envsec::error::Result<String> {
        self.get_id_calls.set(self.get_id_calls.get() + 1);
        self.providers.borrow_mut().push(provider.to_string());
        if self.fail.get() {
            return Err(ProviderError::new(
                "GetId",
                Some("NotAuthorizedException".to_string()),
                "Invalid login token.",
            )
            .into());
        }
        Ok("us-west-2:identity-1".to_string())
    }

    fn get_credentials(
        &self,
        identity_id: &str,
        _provider: &str,
        _id_token: &str,
    ) -> envsec::error::Result<Credentials> {
        self.credential_calls.set(self.credential_calls.get() + 1);
        Ok(Credentials {
            access_key_id: format!("AKIA{}", self.credential_calls.get()),
            secret_access_key: "secret".to_string(),
            session_token: format!("session-for-{}", identity_id),
            expiration: self.expiration(),
        })
    }
}

/// Secrets service fake: one document per name, values per environment.
#[derive(Default)]
pub struct FakeSecrets {
    projects: RefCell<HashMap<String, BTreeMap<String, Secret>>>,
    calls: RefCell<Vec<&'static str>>,
    pub batch_sizes: RefCell<Vec<usize>>,
}

impl FakeSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|m| **m == method).count()
    }

    /// Value of `name` in `env`, if any.
    pub fn value(&self, project_id: &str, name: &str, env: &str) -> Option<Vec<u8>> {
        self.projects
            .borrow()
            .get(project_id)?
            .get(name)?
            .environment_values
            .get(env)
            .cloned()
    }

    fn apply_patch(&self, request: PatchSecret) {
        let mut projects = self.projects.borrow_mut();
        let secrets = projects.entry(request.project_id).or_default();
        let entry = secrets
            .entry(request.secret.name.clone())
            .or_insert_with(|| Secret {
                name: request.secret.name.clone(),
                environment_values: BTreeMap::new(),
            });
        entry
            .environment_values
            .extend(request.secret.environment_values);
    }

    fn apply_delete(&self, request: DeleteSecret) {
        let mut projects = self.projects.borrow_mut();
        if let Some(secret) = projects
            .get_mut(&request.project_id)
            .and_then(|s| s.get_mut(&request.secret_name))
        {
            for env in &request.environments {
                secret.environment_values.remove(env);
            }
        }
    }
}

impl SecretsApi for FakeSecrets {
    fn list_secrets(&self, project_id: &str) -> Result<Vec<Secret>, ProviderError> {
        self.calls.borrow_mut().push("ListSecrets");
        Ok(self
            .projects
            .borrow()
            .get(project_id)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default())
    }

    fn patch_secret(&self, request: PatchSecret) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push("PatchSecret");
        self.apply_patch(request);
        Ok(())
    }

    fn delete_secret(&self, request: DeleteSecret) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push("DeleteSecret");
        self.apply_delete(request);
        Ok(())
    }

    fn batch(&self, actions: Vec<Action>) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push("Batch");
        self.batch_sizes.borrow_mut().push(actions.len());
        for action in actions {
            match action {
                Action::Patch(req) => self.apply_patch(req),
                Action::Delete(req) => self.apply_delete(req),
            }
        }
        Ok(())
    }
}
