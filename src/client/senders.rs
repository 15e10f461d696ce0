//! `/verified_senders` endpoints (single sender verification).

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Sender identity fields, used for both requests and responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    /// Label for the sender.
    pub nickname: String,
    /// From address.
    pub from_email: String,
    /// From display name.
    #[serde(default)]
    pub from_name: String,
    /// Reply-to address.
    pub reply_to: String,
    /// Reply-to display name.
    #[serde(default)]
    pub reply_to_name: String,
    /// Street address.
    pub address: String,
    /// Second address line.
    #[serde(default)]
    pub address2: String,
    /// City.
    pub city: String,
    /// State or region.
    #[serde(default)]
    pub state: String,
    /// Postal code.
    #[serde(default)]
    pub zip: String,
    /// Country.
    pub country: String,
}

/// A sender identity with its verification status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedSender {
    /// Sender id.
    pub id: i64,
    /// Identity fields.
    #[serde(flatten)]
    pub identity: SenderIdentity,
    /// Whether the from address has been verified.
    #[serde(default)]
    pub verified: bool,
    /// Whether the sender is locked against edits.
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
struct SenderList {
    #[serde(default)]
    results: Vec<VerifiedSender>,
}

impl SendgridClient {
    /// `POST /verified_senders`
    pub async fn create_verified_sender(
        &self,
        identity: &SenderIdentity,
    ) -> Result<VerifiedSender, ApiError> {
        self.send(Method::POST, "verified_senders", identity).await
    }

    /// Look a sender up in `GET /verified_senders`; there is no single-item
    /// endpoint.
    pub async fn get_verified_sender(&self, id: i64) -> Result<VerifiedSender, ApiError> {
        let list: SenderList = self.get("verified_senders").await?;
        list.results
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("verified sender {}", id)))
    }

    /// `PATCH /verified_senders/{id}`
    pub async fn update_verified_sender(
        &self,
        id: i64,
        identity: &SenderIdentity,
    ) -> Result<VerifiedSender, ApiError> {
        self.send(Method::PATCH, Endpoint::new("verified_senders").param(id), identity)
            .await
    }

    /// `DELETE /verified_senders/{id}`
    pub async fn delete_verified_sender(&self, id: i64) -> Result<(), ApiError> {
        self.delete(Endpoint::new("verified_senders").param(id)).await
    }
}
