//! `/asm/groups` endpoints (suppression / unsubscribe groups).

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Body for creating or updating an unsubscribe group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsubscribeGroupRequest {
    /// Name shown to recipients.
    pub name: String,
    /// Description shown to recipients.
    pub description: String,
    /// Whether new sends use this group by default.
    pub is_default: bool,
}

/// An unsubscribe group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnsubscribeGroup {
    /// Group identifier.
    pub id: i64,
    /// Name shown to recipients.
    pub name: String,
    /// Description shown to recipients.
    #[serde(default)]
    pub description: String,
    /// Whether new sends use this group by default.
    #[serde(default)]
    pub is_default: bool,
    /// Number of addresses that unsubscribed from the group.
    #[serde(default)]
    pub unsubscribes: i64,
}

impl SendgridClient {
    /// `POST /asm/groups`
    pub async fn create_unsubscribe_group(
        &self,
        request: &UnsubscribeGroupRequest,
    ) -> Result<UnsubscribeGroup, ApiError> {
        self.send(Method::POST, "asm/groups", request).await
    }

    /// `GET /asm/groups/{id}`
    pub async fn get_unsubscribe_group(&self, id: i64) -> Result<UnsubscribeGroup, ApiError> {
        self.get(Endpoint::new("asm/groups").param(id)).await
    }

    /// `PATCH /asm/groups/{id}`
    pub async fn update_unsubscribe_group(
        &self,
        id: i64,
        request: &UnsubscribeGroupRequest,
    ) -> Result<UnsubscribeGroup, ApiError> {
        self.send(Method::PATCH, Endpoint::new("asm/groups").param(id), request)
            .await
    }

    /// `DELETE /asm/groups/{id}`
    pub async fn delete_unsubscribe_group(&self, id: i64) -> Result<(), ApiError> {
        self.delete(Endpoint::new("asm/groups").param(id)).await
    }
}
