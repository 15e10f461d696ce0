//! `sendgrid_parse_webhook`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_id, Resource, ResourceContext};
use crate::client::webhooks::ParseWebhook;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_parse_webhook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseWebhookState {
    /// Same as `hostname`.
    pub id: Option<String>,
    /// Receiving hostname.
    pub hostname: String,
    /// Where parsed mail is posted.
    pub url: String,
    /// Run spam checks.
    pub spam_check: Option<bool>,
    /// Post the raw MIME message.
    pub send_raw: Option<bool>,
}

impl ParseWebhookState {
    fn webhook(&self) -> ParseWebhook {
        ParseWebhook {
            hostname: self.hostname.clone(),
            url: self.url.clone(),
            spam_check: self.spam_check.unwrap_or(false),
            send_raw: self.send_raw.unwrap_or(false),
        }
    }
}

impl From<ParseWebhook> for ParseWebhookState {
    fn from(webhook: ParseWebhook) -> Self {
        Self {
            id: Some(webhook.hostname.clone()),
            hostname: webhook.hostname,
            url: webhook.url,
            spam_check: Some(webhook.spam_check),
            send_raw: Some(webhook.send_raw),
        }
    }
}

/// Manages inbound parse settings for a hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseWebhookResource;

#[async_trait]
impl Resource for ParseWebhookResource {
    type State = ParseWebhookState;

    fn type_name(&self) -> &'static str {
        "sendgrid_parse_webhook"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Posts mail received at a hostname to a URL.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("hostname", Attribute::required_string().with_force_new())
            .with_attribute("url", Attribute::required_string())
            .with_attribute("spam_check", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("send_raw", Attribute::optional_bool().with_default(json!(false)))
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: ParseWebhookState,
    ) -> Result<ParseWebhookState, ProviderError> {
        let client = ctx.client();
        let webhook = planned.webhook();
        let created = ctx
            .call("creating parse webhook", || client.create_parse_webhook(&webhook))
            .await?;
        Ok(created.into())
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: ParseWebhookState,
    ) -> Result<Option<ParseWebhookState>, ProviderError> {
        let hostname = require_id(&current.id, "parse webhook")?;
        let client = ctx.client();
        let webhook = ctx
            .call_optional("reading parse webhook", || client.get_parse_webhook(hostname))
            .await?;
        Ok(webhook.map(Into::into))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        _prior: ParseWebhookState,
        planned: ParseWebhookState,
    ) -> Result<ParseWebhookState, ProviderError> {
        let client = ctx.client();
        let webhook = planned.webhook();
        let updated = ctx
            .call("updating parse webhook", || client.update_parse_webhook(&webhook))
            .await?;
        Ok(updated.into())
    }

    async fn delete(&self, ctx: &ResourceContext, current: ParseWebhookState) -> Result<(), ProviderError> {
        let hostname = require_id(&current.id, "parse webhook")?;
        let client = ctx.client();
        ctx.call("deleting parse webhook", || client.delete_parse_webhook(hostname))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<ParseWebhookState, ProviderError> {
        let client = ctx.client();
        let webhook = ctx
            .call("importing parse webhook", || client.get_parse_webhook(id))
            .await?;
        Ok(webhook.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_is_the_id() {
        let state = ParseWebhookState::from(ParseWebhook {
            hostname: "parse.example.com".to_string(),
            url: "https://app.example.com/inbound".to_string(),
            spam_check: true,
            send_raw: false,
        });

        assert_eq!(state.id.as_deref(), Some("parse.example.com"));
        assert!(state.webhook().spam_check);
    }
}
