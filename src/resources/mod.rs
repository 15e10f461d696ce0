//! Managed SendGrid objects.
//!
//! Each resource implements [`Resource`] over a typed state model. The
//! provider talks to them through [`AnyResource`], which moves state in and
//! out of JSON.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ApiError, SendgridClient};
use crate::error::ProviderError;
use crate::retry::{retry_on_rate_limit, RetryPolicy};
use crate::schema::Schema;

pub mod api_key;
pub mod domain_authentication;
pub mod enforced_tls;
pub mod event_webhook;
pub mod link_branding;
pub mod parse_webhook;
pub mod sender_verification;
pub mod subuser;
pub mod teammate;
pub mod template;
pub mod template_version;
pub mod unsubscribe_group;

/// Everything a callback needs to reach SendGrid.
#[derive(Debug, Clone)]
pub struct ResourceContext {
    client: SendgridClient,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl ResourceContext {
    /// Create a context. `cancel` aborts in-flight retry waits.
    pub fn new(client: SendgridClient, retry: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            client,
            retry,
            cancel,
        }
    }

    /// The SendGrid client.
    pub fn client(&self) -> &SendgridClient {
        &self.client
    }

    /// The retry policy for rate-limited calls.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one SendGrid call through the rate-limit retrier.
    ///
    /// `operation` names the call in error messages, e.g. `creating API key`.
    pub async fn call<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match retry_on_rate_limit(&self.retry, &self.cancel, call).await {
            Ok(value) => {
                debug!(operation, "SendGrid call succeeded");
                Ok(value)
            },
            Err(err) => {
                if err.is_exhausted() {
                    warn!(operation, error = %err, "giving up on rate-limited SendGrid call");
                } else {
                    debug!(operation, error = %err, "SendGrid call failed");
                }
                Err(ProviderError::from_api(operation, err))
            },
        }
    }

    /// Like [`ResourceContext::call`], but a 404 yields `None`.
    pub async fn call_optional<T, F, Fut>(
        &self,
        operation: &str,
        call: F,
    ) -> Result<Option<T>, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.call(operation, call).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A resource type with full lifecycle.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Typed state. Unknown and unset attributes arrive as absent fields.
    type State: Serialize + DeserializeOwned + Send + 'static;

    /// Type name, e.g. `sendgrid_api_key`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Create the remote object from the planned state.
    async fn create(&self, ctx: &ResourceContext, planned: Self::State)
        -> Result<Self::State, ProviderError>;

    /// Refresh state. `None` means the object is gone.
    async fn read(
        &self,
        ctx: &ResourceContext,
        current: Self::State,
    ) -> Result<Option<Self::State>, ProviderError>;

    /// Apply an in-place change.
    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Self::State,
        planned: Self::State,
    ) -> Result<Self::State, ProviderError>;

    /// Remove the remote object.
    async fn delete(&self, ctx: &ResourceContext, current: Self::State) -> Result<(), ProviderError>;

    /// Build state for an existing object from its import id.
    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<Self::State, ProviderError>;
}

/// A [`Resource`] with its state as JSON.
#[async_trait]
pub trait AnyResource: Send + Sync {
    /// Type name.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// See [`Resource::create`].
    async fn create(&self, ctx: &ResourceContext, planned: Value) -> Result<Value, ProviderError>;

    /// See [`Resource::read`]. Returns `Value::Null` when the object is gone.
    async fn read(&self, ctx: &ResourceContext, current: Value) -> Result<Value, ProviderError>;

    /// See [`Resource::update`].
    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// See [`Resource::delete`].
    async fn delete(&self, ctx: &ResourceContext, current: Value) -> Result<(), ProviderError>;

    /// See [`Resource::import`].
    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<R: Resource> AnyResource for R {
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    async fn create(&self, ctx: &ResourceContext, planned: Value) -> Result<Value, ProviderError> {
        let state = Resource::create(self, ctx, decode_state(planned)?).await?;
        encode_state(&state)
    }

    async fn read(&self, ctx: &ResourceContext, current: Value) -> Result<Value, ProviderError> {
        match Resource::read(self, ctx, decode_state(current)?).await? {
            Some(state) => encode_state(&state),
            None => Ok(Value::Null),
        }
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let state =
            Resource::update(self, ctx, decode_state(prior)?, decode_state(planned)?).await?;
        encode_state(&state)
    }

    async fn delete(&self, ctx: &ResourceContext, current: Value) -> Result<(), ProviderError> {
        Resource::delete(self, ctx, decode_state(current)?).await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<Value, ProviderError> {
        let state = Resource::import(self, ctx, id).await?;
        encode_state(&state)
    }
}

/// Decode JSON state into a typed model.
///
/// Top-level nulls (unknown or unset attributes) are dropped first so that
/// `#[serde(default)]` applies to them.
pub fn decode_state<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    let value = match value {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

/// Encode a typed model as JSON state.
pub fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// The id of an existing object, or a validation error naming `what`.
pub(crate) fn require_id<'a>(id: &'a Option<String>, what: &str) -> Result<&'a str, ProviderError> {
    id.as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation(format!("{} has no id in state", what)))
}

/// Parse a numeric SendGrid id kept as a string in state.
pub(crate) fn numeric_id(id: &str, what: &str) -> Result<i64, ProviderError> {
    id.parse()
        .map_err(|_| ProviderError::Validation(format!("{} id must be numeric, got '{}'", what, id)))
}

/// All resource types, keyed by type name.
pub fn registry() -> BTreeMap<&'static str, Box<dyn AnyResource>> {
    let resources: Vec<Box<dyn AnyResource>> = vec![
        Box::new(api_key::ApiKeyResource),
        Box::new(domain_authentication::DomainAuthenticationResource),
        Box::new(enforced_tls::EnforcedTlsResource),
        Box::new(event_webhook::EventWebhookResource),
        Box::new(link_branding::LinkBrandingResource),
        Box::new(parse_webhook::ParseWebhookResource),
        Box::new(sender_verification::SenderVerificationResource),
        Box::new(subuser::SubuserResource),
        Box::new(teammate::TeammateResource),
        Box::new(template::TemplateResource),
        Box::new(template_version::TemplateVersionResource),
        Box::new(unsubscribe_group::UnsubscribeGroupResource),
    ];
    resources.into_iter().map(|r| (r.type_name(), r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        id: Option<String>,
        name: String,
        enabled: bool,
    }

    #[test]
    fn test_decode_state_drops_nulls() {
        let state: Sample = decode_state(json!({"id": null, "name": "a", "enabled": null})).unwrap();
        assert_eq!(state.id, None);
        assert_eq!(state.name, "a");
        assert!(!state.enabled);

        let state: Sample = decode_state(Value::Null).unwrap();
        assert_eq!(state.name, "");
    }

    #[test]
    fn test_decode_state_rejects_wrong_types() {
        let err = decode_state::<Sample>(json!({"name": 3})).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_ids() {
        assert_eq!(require_id(&Some("7".into()), "template").unwrap(), "7");
        assert!(require_id(&Some(String::new()), "template").is_err());
        assert!(require_id(&None, "template").is_err());

        assert_eq!(numeric_id("42", "domain").unwrap(), 42);
        assert!(matches!(numeric_id("x", "domain"), Err(ProviderError::Validation(_))));
    }

    #[test]
    fn test_registry_covers_every_resource() {
        let registry = registry();
        assert_eq!(registry.len(), 12);
        for (name, resource) in &registry {
            assert!(name.starts_with("sendgrid_"));
            let schema = resource.schema();
            assert!(schema.attribute("id").is_some(), "{} has no id attribute", name);
        }
    }
}
