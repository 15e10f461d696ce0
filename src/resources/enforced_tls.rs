//! `sendgrid_enforced_tls`
//!
//! The setting always exists. Creating it applies the configured flags and
//! deleting it puts both flags back to `false`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceContext};
use crate::client::settings::EnforcedTls;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// The fixed id of the singleton.
pub const ENFORCED_TLS_ID: &str = "enforced_tls";

/// State of `sendgrid_enforced_tls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcedTlsState {
    /// Always `enforced_tls`.
    pub id: Option<String>,
    /// Refuse delivery without TLS.
    pub require_tls: bool,
    /// Refuse delivery without a valid certificate.
    pub require_valid_cert: bool,
}

impl EnforcedTlsState {
    fn settings(&self) -> EnforcedTls {
        EnforcedTls {
            require_tls: self.require_tls,
            require_valid_cert: self.require_valid_cert,
        }
    }
}

impl From<EnforcedTls> for EnforcedTlsState {
    fn from(settings: EnforcedTls) -> Self {
        Self {
            id: Some(ENFORCED_TLS_ID.to_string()),
            require_tls: settings.require_tls,
            require_valid_cert: settings.require_valid_cert,
        }
    }
}

/// Manages the account's enforced TLS setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnforcedTlsResource;

impl EnforcedTlsResource {
    async fn apply(
        &self,
        ctx: &ResourceContext,
        operation: &str,
        settings: EnforcedTls,
    ) -> Result<EnforcedTlsState, ProviderError> {
        let client = ctx.client();
        let applied = ctx
            .call(operation, || client.update_enforced_tls(&settings))
            .await?;
        Ok(applied.into())
    }
}

#[async_trait]
impl Resource for EnforcedTlsResource {
    type State = EnforcedTlsState;

    fn type_name(&self) -> &'static str {
        "sendgrid_enforced_tls"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Account-wide TLS enforcement for outgoing mail.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "require_tls",
                Attribute::optional_bool()
                    .with_default(serde_json::Value::Bool(false))
                    .with_description("Only deliver to recipients that support TLS 1.1 or later."),
            )
            .with_attribute(
                "require_valid_cert",
                Attribute::optional_bool()
                    .with_default(serde_json::Value::Bool(false))
                    .with_description("Only deliver to recipients with a valid certificate."),
            )
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: EnforcedTlsState,
    ) -> Result<EnforcedTlsState, ProviderError> {
        self.apply(ctx, "setting enforced TLS", planned.settings())
            .await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        _current: EnforcedTlsState,
    ) -> Result<Option<EnforcedTlsState>, ProviderError> {
        let client = ctx.client();
        let settings = ctx
            .call("reading enforced TLS", || client.get_enforced_tls())
            .await?;
        Ok(Some(settings.into()))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        _prior: EnforcedTlsState,
        planned: EnforcedTlsState,
    ) -> Result<EnforcedTlsState, ProviderError> {
        self.apply(ctx, "updating enforced TLS", planned.settings())
            .await
    }

    async fn delete(&self, ctx: &ResourceContext, _current: EnforcedTlsState) -> Result<(), ProviderError> {
        self.apply(ctx, "resetting enforced TLS", EnforcedTls::default())
            .await
            .map(drop)
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<EnforcedTlsState, ProviderError> {
        if id != ENFORCED_TLS_ID {
            return Err(ProviderError::Validation(format!(
                "enforced TLS is imported with id '{}', got '{}'",
                ENFORCED_TLS_ID, id
            )));
        }
        Resource::read(self, ctx, EnforcedTlsState::default())
            .await?
            .ok_or_else(|| ProviderError::NotFound("enforced TLS settings".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_settings() {
        let state = EnforcedTlsState::from(EnforcedTls {
            require_tls: true,
            require_valid_cert: false,
        });
        assert_eq!(state.id.as_deref(), Some(ENFORCED_TLS_ID));
        assert!(state.require_tls);
        assert_eq!(state.settings(), EnforcedTls { require_tls: true, require_valid_cert: false });
    }

    #[test]
    fn test_schema_defaults_to_disabled() {
        let schema = Resource::schema(&EnforcedTlsResource);
        let attr = schema.attribute("require_tls").unwrap();
        assert_eq!(attr.default, Some(serde_json::Value::Bool(false)));
    }
}
