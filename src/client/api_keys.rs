//! `/api_keys` endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Body for creating or replacing an API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyRequest {
    /// Display name.
    pub name: String,
    /// Permission scopes. `None` asks SendGrid for full access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// An API key as SendGrid reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKey {
    /// Key identifier.
    pub api_key_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Granted scopes, including the ones SendGrid adds on its own.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// The secret. Only present in the create response.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl SendgridClient {
    /// `POST /api_keys`
    pub async fn create_api_key(&self, request: &ApiKeyRequest) -> Result<ApiKey, ApiError> {
        self.send(Method::POST, "api_keys", request).await
    }

    /// `GET /api_keys/{id}`
    pub async fn get_api_key(&self, id: &str) -> Result<ApiKey, ApiError> {
        self.get(Endpoint::new("api_keys").param(id)).await
    }

    /// `PUT /api_keys/{id}`
    pub async fn update_api_key(
        &self,
        id: &str,
        request: &ApiKeyRequest,
    ) -> Result<ApiKey, ApiError> {
        self.send(Method::PUT, Endpoint::new("api_keys").param(id), request)
            .await
    }

    /// `DELETE /api_keys/{id}`
    pub async fn delete_api_key(&self, id: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("api_keys").param(id)).await
    }
}
