//! `sendgrid_api_key`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{require_id, Resource, ResourceContext};
use crate::client::api_keys::{ApiKey, ApiKeyRequest};
use crate::error::ProviderError;
use crate::reconcile::{reconcile_scopes, reconcile_write_only};
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_api_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyState {
    /// Key id.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Granted scopes, without the automatic ones.
    pub scopes: Option<Vec<String>>,
    /// The secret, captured at create.
    pub api_key: Option<String>,
}

impl ApiKeyState {
    fn request(&self) -> ApiKeyRequest {
        ApiKeyRequest {
            name: self.name.clone(),
            scopes: self.scopes.clone(),
        }
    }

    /// Merge what SendGrid reports into the configured state.
    fn observe(&self, key: ApiKey) -> Self {
        let desired = self.scopes.as_deref().unwrap_or_default();
        Self {
            id: Some(key.api_key_id),
            name: key.name,
            scopes: Some(reconcile_scopes(desired, &key.scopes)),
            api_key: reconcile_write_only(self.api_key.clone(), key.api_key),
        }
    }
}

/// Manages a SendGrid API key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyResource;

#[async_trait]
impl Resource for ApiKeyResource {
    type State = ApiKeyState;

    fn type_name(&self) -> &'static str {
        "sendgrid_api_key"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A SendGrid API key.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name of the key."),
            )
            .with_attribute(
                "scopes",
                Attribute::optional_string_set()
                    .with_description("Permissions granted to the key. Omit for full access."),
            )
            .with_attribute(
                "api_key",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The key itself. Only known after creation."),
            )
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: ApiKeyState,
    ) -> Result<ApiKeyState, ProviderError> {
        let client = ctx.client();
        let request = planned.request();
        let key = ctx
            .call("creating API key", || client.create_api_key(&request))
            .await?;
        Ok(planned.observe(key))
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: ApiKeyState,
    ) -> Result<Option<ApiKeyState>, ProviderError> {
        let id = require_id(&current.id, "API key")?;
        let client = ctx.client();
        let key = ctx
            .call_optional("reading API key", || client.get_api_key(id))
            .await?;
        Ok(key.map(|key| current.observe(key)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: ApiKeyState,
        planned: ApiKeyState,
    ) -> Result<ApiKeyState, ProviderError> {
        let id = require_id(&prior.id, "API key")?;
        let client = ctx.client();
        let request = planned.request();
        let key = ctx
            .call("updating API key", || client.update_api_key(id, &request))
            .await?;
        let planned = ApiKeyState {
            api_key: prior.api_key.clone(),
            ..planned
        };
        Ok(planned.observe(key))
    }

    async fn delete(&self, ctx: &ResourceContext, current: ApiKeyState) -> Result<(), ProviderError> {
        let id = require_id(&current.id, "API key")?;
        let client = ctx.client();
        ctx.call("deleting API key", || client.delete_api_key(id))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<ApiKeyState, ProviderError> {
        let client = ctx.client();
        let key = ctx
            .call("importing API key", || client.get_api_key(id))
            .await?;
        Ok(ApiKeyState::default().observe(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(scopes: &[&str], secret: Option<&str>) -> ApiKey {
        ApiKey {
            api_key_id: "key-1".to_string(),
            name: "ci".to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            api_key: secret.map(str::to_string),
        }
    }

    #[test]
    fn test_observe_drops_automatic_scopes() {
        let desired = ApiKeyState {
            name: "ci".to_string(),
            scopes: Some(vec!["mail.send".to_string()]),
            ..Default::default()
        };

        let state = desired.observe(key(&["sender_verification_eligible", "mail.send"], Some("SG.x")));

        assert_eq!(state.id.as_deref(), Some("key-1"));
        assert_eq!(state.scopes, Some(vec!["mail.send".to_string()]));
        assert_eq!(state.api_key.as_deref(), Some("SG.x"));
    }

    #[test]
    fn test_observe_keeps_secret_from_state() {
        let current = ApiKeyState {
            id: Some("key-1".to_string()),
            name: "ci".to_string(),
            scopes: None,
            api_key: Some("SG.secret".to_string()),
        };

        let state = current.observe(key(&["mail.send"], None));

        assert_eq!(state.api_key.as_deref(), Some("SG.secret"));
        assert_eq!(state.scopes, Some(vec!["mail.send".to_string()]));
    }

    #[test]
    fn test_request_omits_unset_scopes() {
        let state = ApiKeyState {
            name: "ci".to_string(),
            ..Default::default()
        };
        assert_eq!(state.request().scopes, None);
    }
}
