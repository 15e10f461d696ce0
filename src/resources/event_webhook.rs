//! `sendgrid_event_webhook`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_id, Resource, ResourceContext};
use crate::client::webhooks::{EventToggles, EventWebhook, EventWebhookRequest};
use crate::error::ProviderError;
use crate::reconcile::reconcile_write_only;
use crate::schema::{Attribute, Schema};

/// Names of the per-event toggles.
const EVENTS: &[&str] = &[
    "bounce",
    "click",
    "deferred",
    "delivered",
    "dropped",
    "group_resubscribe",
    "group_unsubscribe",
    "open",
    "processed",
    "spam_report",
    "unsubscribe",
];

/// State of a `sendgrid_event_webhook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventWebhookState {
    /// Webhook id.
    pub id: Option<String>,
    /// Destination URL.
    pub url: String,
    /// Whether events are posted.
    pub enabled: Option<bool>,
    /// Label shown in the SendGrid UI.
    pub friendly_name: Option<String>,
    /// Which events are posted.
    #[serde(flatten)]
    pub events: EventToggles,
    /// OAuth client id.
    pub oauth_client_id: Option<String>,
    /// OAuth client secret. Never read back.
    pub oauth_client_secret: Option<String>,
    /// OAuth token endpoint.
    pub oauth_token_url: Option<String>,
}

impl EventWebhookState {
    fn request(&self) -> EventWebhookRequest {
        EventWebhookRequest {
            enabled: self.enabled.unwrap_or(true),
            url: self.url.clone(),
            events: self.events,
            friendly_name: self.friendly_name.clone(),
            oauth_client_id: self.oauth_client_id.clone(),
            oauth_client_secret: self.oauth_client_secret.clone(),
            oauth_token_url: self.oauth_token_url.clone(),
        }
    }

    fn observe(&self, webhook: EventWebhook) -> Self {
        Self {
            id: Some(webhook.id),
            url: webhook.url,
            enabled: Some(webhook.enabled),
            friendly_name: webhook.friendly_name.filter(|n| !n.is_empty()),
            events: webhook.events,
            oauth_client_id: webhook.oauth_client_id.filter(|c| !c.is_empty()),
            oauth_client_secret: reconcile_write_only(self.oauth_client_secret.clone(), None),
            oauth_token_url: webhook.oauth_token_url.filter(|u| !u.is_empty()),
        }
    }
}

/// Manages an event webhook.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventWebhookResource;

#[async_trait]
impl Resource for EventWebhookResource {
    type State = EventWebhookState;

    fn type_name(&self) -> &'static str {
        "sendgrid_event_webhook"
    }

    fn schema(&self) -> Schema {
        let schema = Schema::v0()
            .with_description("Posts delivery and engagement events to a URL.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("url", Attribute::required_string())
            .with_attribute("enabled", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute("friendly_name", Attribute::optional_string())
            .with_attribute("oauth_client_id", Attribute::optional_string())
            .with_attribute(
                "oauth_client_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Write-only. SendGrid never returns it."),
            )
            .with_attribute("oauth_token_url", Attribute::optional_string());

        EVENTS.iter().fold(schema, |schema, event| {
            schema.with_attribute(
                *event,
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description(format!("Post {} events.", event.replace('_', " "))),
            )
        })
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: EventWebhookState,
    ) -> Result<EventWebhookState, ProviderError> {
        let client = ctx.client();
        let request = planned.request();
        let webhook = ctx
            .call("creating event webhook", || client.create_event_webhook(&request))
            .await?;
        Ok(planned.observe(webhook))
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: EventWebhookState,
    ) -> Result<Option<EventWebhookState>, ProviderError> {
        let id = require_id(&current.id, "event webhook")?;
        let client = ctx.client();
        let webhook = ctx
            .call_optional("reading event webhook", || client.get_event_webhook(id))
            .await?;
        Ok(webhook.map(|webhook| current.observe(webhook)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: EventWebhookState,
        planned: EventWebhookState,
    ) -> Result<EventWebhookState, ProviderError> {
        let id = require_id(&prior.id, "event webhook")?;
        let client = ctx.client();
        let request = planned.request();
        let webhook = ctx
            .call("updating event webhook", || {
                client.update_event_webhook(id, &request)
            })
            .await?;
        Ok(planned.observe(webhook))
    }

    async fn delete(&self, ctx: &ResourceContext, current: EventWebhookState) -> Result<(), ProviderError> {
        let id = require_id(&current.id, "event webhook")?;
        let client = ctx.client();
        ctx.call("deleting event webhook", || client.delete_event_webhook(id))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<EventWebhookState, ProviderError> {
        let client = ctx.client();
        let webhook = ctx
            .call("importing event webhook", || client.get_event_webhook(id))
            .await?;
        Ok(EventWebhookState::default().observe(webhook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{decode_state, encode_state};

    #[test]
    fn test_state_flattens_event_toggles() {
        let state: EventWebhookState = decode_state(json!({
            "url": "https://hooks.example.com/sendgrid",
            "bounce": true,
            "open": null,
            "oauth_client_secret": "s3cret"
        }))
        .unwrap();

        assert!(state.events.bounce);
        assert!(!state.events.open);

        let value = encode_state(&state).unwrap();
        assert_eq!(value["bounce"], true);
        assert_eq!(value["spam_report"], false);
    }

    #[test]
    fn test_observe_keeps_secret() {
        let desired = EventWebhookState {
            url: "https://hooks.example.com/sendgrid".to_string(),
            oauth_client_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        let state = desired.observe(EventWebhook {
            id: "wh-1".to_string(),
            enabled: true,
            url: "https://hooks.example.com/sendgrid".to_string(),
            events: EventToggles {
                delivered: true,
                ..Default::default()
            },
            friendly_name: Some(String::new()),
            oauth_client_id: None,
            oauth_token_url: None,
        });

        assert_eq!(state.oauth_client_secret.as_deref(), Some("s3cret"));
        assert_eq!(state.friendly_name, None);
        assert!(state.events.delivered);
    }

    #[test]
    fn test_schema_lists_every_event() {
        let schema = Resource::schema(&EventWebhookResource);
        for event in EVENTS {
            assert!(schema.attribute(event).is_some(), "missing {}", event);
        }
        assert!(schema.attribute("oauth_client_secret").unwrap().flags.sensitive);
    }
}
