//! The SendGrid provider.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::SendgridClient;
use crate::config::ProviderConfig;
use crate::data_sources::{self, AnyDataSource};
use crate::error::ProviderError;
use crate::plan;
use crate::resources::{self, AnyResource, ResourceContext};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Manages SendGrid account objects.
///
/// Holds no client until [`ProviderService::configure`] succeeds. Every
/// resource callback before that fails with a configuration error.
pub struct SendgridProvider {
    resources: BTreeMap<&'static str, Box<dyn AnyResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn AnyDataSource>>,
    context: RwLock<Option<Arc<ResourceContext>>>,
    cancel: CancellationToken,
    env: EnvLookup,
}

impl fmt::Debug for SendgridProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendgridProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Default for SendgridProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SendgridProvider {
    /// A provider that falls back to the process environment for
    /// configuration.
    pub fn new() -> Self {
        Self::with_env(|name| std::env::var(name).ok())
    }

    /// A provider with a custom environment lookup.
    pub fn with_env<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            resources: resources::registry(),
            data_sources: data_sources::registry(),
            context: RwLock::new(None),
            cancel: CancellationToken::new(),
            env: Box::new(env),
        }
    }

    /// Token cancelled by [`ProviderService::stop`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn resolve(&self, config: &Value) -> Result<ProviderConfig, Vec<Diagnostic>> {
        ProviderConfig::resolve_with(config, |name| (self.env)(name))
    }

    async fn context(&self) -> Result<Arc<ResourceContext>, ProviderError> {
        self.context.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn AnyResource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn AnyDataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderService for SendgridProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |s, (name, r)| s.with_resource(*name, r.schema()));
        self.data_sources
            .iter()
            .fold(schema, |s, (name, d)| s.with_data_source(*name, d.schema()))
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::from_schema(&self.schema()).with_plan_destroy()
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if !has_errors(&diagnostics) {
            if let Err(resolve) = self.resolve(&config) {
                diagnostics.extend(resolve);
            }
        }
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        let config = match self.resolve(&config) {
            Ok(config) => config,
            Err(resolve) => {
                diagnostics.extend(resolve);
                return Ok(diagnostics);
            }
        };

        let client = SendgridClient::new(&config.api_key, config.subuser.clone(), Some(&config.base_url))
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;
        info!(
            base_url = %config.base_url,
            subuser = ?config.subuser,
            max_attempts = config.retry.max_attempts,
            "SendGrid client configured"
        );

        let context = ResourceContext::new(client, config.retry, self.cancel.clone());
        *self.context.write().await = Some(Arc::new(context));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("cancelling in-flight SendGrid calls");
        self.cancel.cancel();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        Ok(validation::validate(&schema, &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        plan::plan(&schema, prior_state.as_ref(), &proposed_state)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        resource.create(&ctx, planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let state = resource.read(&ctx, current_state).await?;
        if state.is_null() {
            info!(resource_type, "resource no longer exists in SendGrid");
        }
        Ok(state)
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        resource.update(&ctx, prior_state, planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        resource.delete(&ctx, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let state = resource.import(&ctx, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.data_source(data_source_type)?.schema();
        Ok(validation::validate(&schema, &config))
    }

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let ctx = self.context().await?;
        data_source.read(&ctx, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> SendgridProvider {
        SendgridProvider::with_env(|_| None)
    }

    #[test]
    fn test_schema_lists_everything() {
        let schema = provider().schema();

        assert_eq!(schema.resources.len(), 12);
        assert_eq!(schema.data_sources.len(), 5);
        assert!(schema.provider.attribute("api_key").unwrap().flags.sensitive);
        assert!(schema.resources.contains_key("sendgrid_enforced_tls"));
        assert!(schema.data_sources.contains_key("sendgrid_template_version"));
    }

    #[test]
    fn test_metadata_matches_schema() {
        let metadata = provider().metadata();
        assert_eq!(metadata.resources.len(), 12);
        assert!(metadata.data_sources.contains(&"sendgrid_api_key".to_string()));
        assert!(metadata.plan_destroy);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_diagnostic() {
        let diagnostics = provider().configure(json!({})).await.unwrap();
        assert!(has_errors(&diagnostics));
    }

    #[tokio::test]
    async fn test_api_key_from_environment() {
        let provider = SendgridProvider::with_env(|name| {
            (name == "SENDGRID_API_KEY").then(|| "SG.env".to_string())
        });
        let diagnostics = provider.configure(Value::Null).await.unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert!(provider.context().await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_rejected() {
        let diagnostics = provider()
            .validate_provider_config(json!({"api_key": "SG.x", "region": "eu"}))
            .await
            .unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.attribute.as_deref() == Some("region")));
    }

    #[tokio::test]
    async fn test_callbacks_before_configure_fail() {
        let err = provider()
            .create("sendgrid_template", json!({"name": "welcome"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = provider();
        let err = provider
            .plan("sendgrid_widget", None, json!({}), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("sendgrid_widget", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_plan_uses_resource_schema() {
        let result = provider()
            .plan("sendgrid_template", None, json!({"name": "welcome"}), json!({}))
            .await
            .unwrap();
        assert_eq!(result.planned_state["generation"], json!("dynamic"));
        assert!(!result.requires_replace);
    }

    #[tokio::test]
    async fn test_stop_cancels_token() {
        let provider = provider();
        let token = provider.cancellation_token();
        provider.stop().await.unwrap();
        assert!(token.is_cancelled());
    }
}
