//! Event and inbound parse webhook endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Event toggles shared by the event webhook request and response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventToggles {
    /// Bounce events.
    #[serde(default)]
    pub bounce: bool,
    /// Click events.
    #[serde(default)]
    pub click: bool,
    /// Deferred delivery events.
    #[serde(default)]
    pub deferred: bool,
    /// Delivered events.
    #[serde(default)]
    pub delivered: bool,
    /// Dropped events.
    #[serde(default)]
    pub dropped: bool,
    /// Group resubscribe events.
    #[serde(default)]
    pub group_resubscribe: bool,
    /// Group unsubscribe events.
    #[serde(default)]
    pub group_unsubscribe: bool,
    /// Open events.
    #[serde(default)]
    pub open: bool,
    /// Processed events.
    #[serde(default)]
    pub processed: bool,
    /// Spam report events.
    #[serde(default)]
    pub spam_report: bool,
    /// Unsubscribe events.
    #[serde(default)]
    pub unsubscribe: bool,
}

/// Body for creating or updating an event webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventWebhookRequest {
    /// Whether events are posted.
    pub enabled: bool,
    /// Destination URL.
    pub url: String,
    /// Which events are posted.
    #[serde(flatten)]
    pub events: EventToggles,
    /// Label shown in the SendGrid UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// OAuth client id used to fetch a token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_client_id: Option<String>,
    /// OAuth client secret. Write-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_client_secret: Option<String>,
    /// OAuth token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token_url: Option<String>,
}

/// An event webhook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventWebhook {
    /// Webhook id.
    pub id: String,
    /// Whether events are posted.
    #[serde(default)]
    pub enabled: bool,
    /// Destination URL.
    pub url: String,
    /// Which events are posted.
    #[serde(flatten)]
    pub events: EventToggles,
    /// Label shown in the SendGrid UI.
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// OAuth client id.
    #[serde(default)]
    pub oauth_client_id: Option<String>,
    /// OAuth token endpoint.
    #[serde(default)]
    pub oauth_token_url: Option<String>,
}

/// Inbound parse settings for one hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWebhook {
    /// Receiving hostname.
    pub hostname: String,
    /// Where parsed mail is posted.
    pub url: String,
    /// Run spam checks on incoming mail.
    #[serde(default)]
    pub spam_check: bool,
    /// Post the raw MIME message.
    #[serde(default)]
    pub send_raw: bool,
}

#[derive(Debug, Serialize)]
struct UpdateParseWebhook<'a> {
    url: &'a str,
    spam_check: bool,
    send_raw: bool,
}

impl SendgridClient {
    /// `POST /user/webhooks/event/settings`
    pub async fn create_event_webhook(
        &self,
        request: &EventWebhookRequest,
    ) -> Result<EventWebhook, ApiError> {
        self.send(Method::POST, "user/webhooks/event/settings", request)
            .await
    }

    /// `GET /user/webhooks/event/settings/{id}`
    pub async fn get_event_webhook(&self, id: &str) -> Result<EventWebhook, ApiError> {
        self.get(Endpoint::new("user/webhooks/event/settings").param(id))
            .await
    }

    /// `PATCH /user/webhooks/event/settings/{id}`
    pub async fn update_event_webhook(
        &self,
        id: &str,
        request: &EventWebhookRequest,
    ) -> Result<EventWebhook, ApiError> {
        self.send(
            Method::PATCH,
            Endpoint::new("user/webhooks/event/settings").param(id),
            request,
        )
        .await
    }

    /// `DELETE /user/webhooks/event/settings/{id}`
    pub async fn delete_event_webhook(&self, id: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("user/webhooks/event/settings").param(id))
            .await
    }

    /// `POST /user/webhooks/parse/settings`
    pub async fn create_parse_webhook(&self, webhook: &ParseWebhook) -> Result<ParseWebhook, ApiError> {
        self.send(Method::POST, "user/webhooks/parse/settings", webhook)
            .await
    }

    /// `GET /user/webhooks/parse/settings/{hostname}`
    pub async fn get_parse_webhook(&self, hostname: &str) -> Result<ParseWebhook, ApiError> {
        self.get(Endpoint::new("user/webhooks/parse/settings").param(hostname))
            .await
    }

    /// `PATCH /user/webhooks/parse/settings/{hostname}`
    pub async fn update_parse_webhook(&self, webhook: &ParseWebhook) -> Result<ParseWebhook, ApiError> {
        let body = UpdateParseWebhook {
            url: &webhook.url,
            spam_check: webhook.spam_check,
            send_raw: webhook.send_raw,
        };
        self.send(
            Method::PATCH,
            Endpoint::new("user/webhooks/parse/settings").param(&webhook.hostname),
            &body,
        )
        .await
    }

    /// `DELETE /user/webhooks/parse/settings/{hostname}`
    pub async fn delete_parse_webhook(&self, hostname: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("user/webhooks/parse/settings").param(hostname))
            .await
    }
}
