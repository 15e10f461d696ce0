//! `/teammates` endpoints.
//!
//! A teammate starts as a pending invitation identified by a token and only
//! gets a username once the invitee accepts.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Page size used when listing teammates.
const LIST_LIMIT: u32 = 500;

/// Access a teammate has to one subuser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubuserAccess {
    /// Subuser id.
    pub id: i64,
    /// `admin` or `restricted`.
    pub permission_type: String,
    /// Scopes for `restricted` access.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Body for inviting a teammate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteTeammateRequest {
    /// Address the invitation is sent to.
    pub email: String,
    /// Scopes granted on acceptance. Ignored for admins.
    pub scopes: Vec<String>,
    /// Whether the teammate gets every scope.
    pub is_admin: bool,
    /// Restrict the teammate to the listed subusers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_restricted_subuser_access: Option<bool>,
    /// Per-subuser access when restricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subuser_access: Option<Vec<SubuserAccess>>,
}

/// Body for changing an accepted teammate's permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTeammateRequest {
    /// Scopes to grant. Ignored for admins.
    pub scopes: Vec<String>,
    /// Whether the teammate gets every scope.
    pub is_admin: bool,
    /// Restrict the teammate to the listed subusers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_restricted_subuser_access: Option<bool>,
    /// Per-subuser access when restricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subuser_access: Option<Vec<SubuserAccess>>,
}

/// An invitation that has not been accepted yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingTeammate {
    /// Invited address.
    pub email: String,
    /// Token identifying the invitation.
    #[serde(default)]
    pub token: String,
    /// Scopes granted on acceptance.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Whether the invitee becomes an admin.
    #[serde(default)]
    pub is_admin: bool,
    /// Epoch second at which the invitation expires.
    #[serde(default)]
    pub expiration_date: Option<i64>,
}

/// An accepted teammate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Teammate {
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// `owner`, `admin` or `teammate`.
    #[serde(default)]
    pub user_type: String,
    /// Whether the teammate has every scope.
    #[serde(default)]
    pub is_admin: bool,
    /// Granted scopes. Absent from list responses.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Subuser restrictions of an accepted teammate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TeammateSubuserAccess {
    /// Whether access is restricted to `subuser_access`.
    #[serde(default)]
    pub has_restricted_subuser_access: bool,
    /// Per-subuser access.
    #[serde(default)]
    pub subuser_access: Vec<SubuserAccess>,
}

#[derive(Debug, Deserialize)]
struct ResultList<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

impl SendgridClient {
    /// `POST /teammates`
    pub async fn invite_teammate(
        &self,
        request: &InviteTeammateRequest,
    ) -> Result<PendingTeammate, ApiError> {
        self.send(Method::POST, "teammates", request).await
    }

    /// `GET /teammates/{username}`
    pub async fn get_teammate(&self, username: &str) -> Result<Teammate, ApiError> {
        self.get(Endpoint::new("teammates").param(username)).await
    }

    /// `GET /teammates`, following `offset` until a short page.
    pub async fn list_teammates(&self) -> Result<Vec<Teammate>, ApiError> {
        let mut teammates = Vec::new();
        let mut offset = 0u32;
        loop {
            let page: ResultList<Teammate> = self
                .get_query("teammates", &[("limit", LIST_LIMIT), ("offset", offset)])
                .await?;
            let fetched = page.result.len();
            teammates.extend(page.result);
            if fetched < LIST_LIMIT as usize {
                return Ok(teammates);
            }
            offset += LIST_LIMIT;
        }
    }

    /// Find an accepted teammate by email address.
    ///
    /// The list endpoint omits scopes, so a hit is followed by a lookup by
    /// username.
    pub async fn find_teammate_by_email(&self, email: &str) -> Result<Teammate, ApiError> {
        let listed = self
            .list_teammates()
            .await?
            .into_iter()
            .find(|t| t.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| ApiError::NotFound(format!("teammate {}", email)))?;
        self.get_teammate(&listed.username).await
    }

    /// `GET /teammates/pending`
    pub async fn list_pending_teammates(&self) -> Result<Vec<PendingTeammate>, ApiError> {
        let page: ResultList<PendingTeammate> = self.get("teammates/pending").await?;
        Ok(page.result)
    }

    /// Find a pending invitation by email address.
    pub async fn find_pending_teammate(&self, email: &str) -> Result<PendingTeammate, ApiError> {
        self.list_pending_teammates()
            .await?
            .into_iter()
            .find(|t| t.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| ApiError::NotFound(format!("pending teammate {}", email)))
    }

    /// `PATCH /teammates/{username}`
    pub async fn update_teammate(
        &self,
        username: &str,
        request: &UpdateTeammateRequest,
    ) -> Result<Teammate, ApiError> {
        self.send(Method::PATCH, Endpoint::new("teammates").param(username), request)
            .await
    }

    /// `GET /teammates/{username}/subuser_access`
    pub async fn get_teammate_subuser_access(
        &self,
        username: &str,
    ) -> Result<TeammateSubuserAccess, ApiError> {
        self.get(Endpoint::new("teammates").param(username).join("subuser_access"))
            .await
    }

    /// `DELETE /teammates/{username}`
    pub async fn delete_teammate(&self, username: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("teammates").param(username)).await
    }

    /// `DELETE /teammates/pending/{token}`
    pub async fn delete_pending_teammate(&self, token: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("teammates/pending").param(token)).await
    }
}
