//! `/subusers` endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Body for creating a subuser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSubuserRequest {
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Sending IPs assigned to the subuser.
    pub ips: Vec<String>,
}

/// The create response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedSubuser {
    /// Login name.
    pub username: String,
    /// Numeric user id.
    pub user_id: i64,
    /// Contact address.
    pub email: String,
}

/// A subuser as listed by SendGrid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subuser {
    /// Numeric user id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Whether the subuser is disabled.
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
struct DisableRequest {
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct IpRecord {
    ip: String,
}

impl SendgridClient {
    /// `POST /subusers`
    pub async fn create_subuser(
        &self,
        request: &CreateSubuserRequest,
    ) -> Result<CreatedSubuser, ApiError> {
        self.send(Method::POST, "subusers", request).await
    }

    /// `GET /subusers?username=...`, keeping the exact match only.
    pub async fn get_subuser(&self, username: &str) -> Result<Subuser, ApiError> {
        let listed: Vec<Subuser> = self
            .get_query("subusers", &[("username", username)])
            .await?;
        listed
            .into_iter()
            .find(|s| s.username == username)
            .ok_or_else(|| ApiError::NotFound(format!("subuser {}", username)))
    }

    /// `PATCH /subusers/{username}`
    pub async fn set_subuser_disabled(&self, username: &str, disabled: bool) -> Result<(), ApiError> {
        self.send_discard(
            Method::PATCH,
            Endpoint::new("subusers").param(username),
            &DisableRequest { disabled },
        )
        .await
    }

    /// `PUT /subusers/{username}/ips`
    pub async fn set_subuser_ips(&self, username: &str, ips: &[String]) -> Result<(), ApiError> {
        self.send_discard(Method::PUT, Endpoint::new("subusers").param(username).join("ips"), ips)
            .await
    }

    /// `GET /ips?subuser=...`
    pub async fn list_subuser_ips(&self, username: &str) -> Result<Vec<String>, ApiError> {
        let records: Vec<IpRecord> = self.get_query("ips", &[("subuser", username)]).await?;
        Ok(records.into_iter().map(|r| r.ip).collect())
    }

    /// `DELETE /subusers/{username}`
    pub async fn delete_subuser(&self, username: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("subusers").param(username)).await
    }
}
