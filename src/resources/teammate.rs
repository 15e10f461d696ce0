//! `sendgrid_teammate`
//!
//! A teammate is addressed by email. Until the invitation is accepted it only
//! exists in the pending list, where it has a token but no username.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{require_id, Resource, ResourceContext};
use crate::client::teammates::{
    InviteTeammateRequest, PendingTeammate, SubuserAccess, Teammate, TeammateSubuserAccess,
    UpdateTeammateRequest,
};
use crate::error::ProviderError;
use crate::reconcile::{reconcile_admin_scopes, reconcile_subuser_access};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// State of a `sendgrid_teammate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeammateState {
    /// Same as `email`.
    pub id: Option<String>,
    /// Invited address.
    pub email: String,
    /// Whether the teammate has every scope.
    pub is_admin: Option<bool>,
    /// Granted scopes.
    pub scopes: Option<Vec<String>>,
    /// Restrict the teammate to `subuser_access`.
    pub has_restricted_subuser_access: Option<bool>,
    /// Per-subuser access.
    pub subuser_access: Option<Vec<SubuserAccess>>,
    /// Login name, once accepted.
    pub username: Option<String>,
    /// First name, once accepted.
    pub first_name: Option<String>,
    /// Last name, once accepted.
    pub last_name: Option<String>,
    /// `owner`, `admin` or `teammate`.
    pub user_type: Option<String>,
    /// Whether the invitation is still open.
    pub is_pending: Option<bool>,
    /// Invitation token while pending.
    pub token: Option<String>,
}

/// Where a teammate currently lives on the SendGrid side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Observed {
    Accepted(Teammate, TeammateSubuserAccess),
    Pending(PendingTeammate),
}

impl TeammateState {
    fn desired_scopes(&self) -> &[String] {
        self.scopes.as_deref().unwrap_or_default()
    }

    fn invite_request(&self) -> InviteTeammateRequest {
        InviteTeammateRequest {
            email: self.email.clone(),
            scopes: self.desired_scopes().to_vec(),
            is_admin: self.is_admin.unwrap_or(false),
            has_restricted_subuser_access: self.has_restricted_subuser_access,
            subuser_access: self.subuser_access.clone(),
        }
    }

    fn update_request(&self) -> UpdateTeammateRequest {
        UpdateTeammateRequest {
            scopes: self.desired_scopes().to_vec(),
            is_admin: self.is_admin.unwrap_or(false),
            has_restricted_subuser_access: self.has_restricted_subuser_access,
            subuser_access: self.subuser_access.clone(),
        }
    }

    /// Merge what SendGrid reports into the configured state.
    pub(crate) fn observe(&self, observed: Observed) -> Self {
        match observed {
            Observed::Accepted(teammate, access) => {
                let desired_access = self.subuser_access.as_deref().unwrap_or_default();
                Self {
                    id: Some(teammate.email.clone()),
                    scopes: Some(reconcile_admin_scopes(
                        teammate.is_admin,
                        self.desired_scopes(),
                        &teammate.scopes,
                    )),
                    email: teammate.email,
                    is_admin: Some(teammate.is_admin),
                    has_restricted_subuser_access: Some(access.has_restricted_subuser_access),
                    subuser_access: Some(reconcile_subuser_access(
                        desired_access,
                        &access.subuser_access,
                    )),
                    username: Some(teammate.username),
                    first_name: Some(teammate.first_name),
                    last_name: Some(teammate.last_name),
                    user_type: Some(teammate.user_type),
                    is_pending: Some(false),
                    token: None,
                }
            },
            Observed::Pending(pending) => Self {
                id: Some(pending.email.clone()),
                scopes: Some(reconcile_admin_scopes(
                    pending.is_admin,
                    self.desired_scopes(),
                    &pending.scopes,
                )),
                email: pending.email,
                is_admin: Some(pending.is_admin),
                has_restricted_subuser_access: Some(
                    self.has_restricted_subuser_access.unwrap_or(false),
                ),
                subuser_access: Some(self.subuser_access.clone().unwrap_or_default()),
                username: None,
                first_name: None,
                last_name: None,
                user_type: None,
                is_pending: Some(true),
                token: Some(pending.token).filter(|t| !t.is_empty()),
            },
        }
    }
}

/// Manages a teammate or teammate invitation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeammateResource;

impl TeammateResource {
    /// Look the teammate up among accepted teammates, then pending invitations.
    pub(crate) async fn find(
        ctx: &ResourceContext,
        email: &str,
    ) -> Result<Option<Observed>, ProviderError> {
        let client = ctx.client();
        if let Some(teammate) = ctx
            .call_optional("reading teammate", || client.find_teammate_by_email(email))
            .await?
        {
            let username = teammate.username.as_str();
            let access = ctx
                .call("reading teammate subuser access", || {
                    client.get_teammate_subuser_access(username)
                })
                .await?;
            return Ok(Some(Observed::Accepted(teammate, access)));
        }

        debug!(email, "teammate not accepted yet, checking pending invitations");
        let pending = ctx
            .call_optional("reading pending teammate", || {
                client.find_pending_teammate(email)
            })
            .await?;
        Ok(pending.map(Observed::Pending))
    }

    async fn invite(
        &self,
        ctx: &ResourceContext,
        planned: &TeammateState,
    ) -> Result<TeammateState, ProviderError> {
        let client = ctx.client();
        let request = planned.invite_request();
        let pending = ctx
            .call("inviting teammate", || client.invite_teammate(&request))
            .await?;
        Ok(planned.observe(Observed::Pending(pending)))
    }

    async fn remove(&self, ctx: &ResourceContext, observed: &Observed) -> Result<(), ProviderError> {
        let client = ctx.client();
        match observed {
            Observed::Accepted(teammate, _) => {
                let username = teammate.username.as_str();
                ctx.call("deleting teammate", || client.delete_teammate(username))
                    .await
            },
            Observed::Pending(pending) => {
                let token = pending.token.as_str();
                ctx.call("deleting pending teammate", || {
                    client.delete_pending_teammate(token)
                })
                .await
            },
        }
    }
}

#[async_trait]
impl Resource for TeammateResource {
    type State = TeammateState;

    fn type_name(&self) -> &'static str {
        "sendgrid_teammate"
    }

    fn schema(&self) -> Schema {
        let access = AttributeType::list(AttributeType::object([
            ("id", AttributeType::Int64),
            ("permission_type", AttributeType::String),
            ("scopes", AttributeType::set(AttributeType::String)),
        ]));

        Schema::v0()
            .with_description("A teammate of the account, or an open invitation.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "email",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Address the invitation is sent to."),
            )
            .with_attribute("is_admin", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute(
                "scopes",
                Attribute::optional_string_set().with_description("Ignored for admins."),
            )
            .with_attribute(
                "has_restricted_subuser_access",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute(
                "subuser_access",
                Attribute::new(access, AttributeFlags::optional_computed())
                    .with_description("Access per subuser when restricted."),
            )
            .with_attribute("username", Attribute::computed_string())
            .with_attribute("first_name", Attribute::computed_string())
            .with_attribute("last_name", Attribute::computed_string())
            .with_attribute("user_type", Attribute::computed_string())
            .with_attribute("is_pending", Attribute::computed_bool())
            .with_attribute("token", Attribute::computed_string().sensitive())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: TeammateState,
    ) -> Result<TeammateState, ProviderError> {
        self.invite(ctx, &planned).await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: TeammateState,
    ) -> Result<Option<TeammateState>, ProviderError> {
        let email = require_id(&current.id, "teammate")?;
        Ok(Self::find(ctx, email)
            .await?
            .map(|observed| current.observe(observed)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: TeammateState,
        planned: TeammateState,
    ) -> Result<TeammateState, ProviderError> {
        let email = require_id(&prior.id, "teammate")?;
        let observed = Self::find(ctx, email)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("teammate {}", email)))?;

        match observed {
            Observed::Accepted(teammate, _) => {
                let client = ctx.client();
                let username = teammate.username.as_str();
                let request = planned.update_request();
                let updated = ctx
                    .call("updating teammate", || client.update_teammate(username, &request))
                    .await?;
                let access = ctx
                    .call("reading teammate subuser access", || {
                        client.get_teammate_subuser_access(username)
                    })
                    .await?;
                Ok(planned.observe(Observed::Accepted(updated, access)))
            },
            pending @ Observed::Pending(_) => {
                // Invitations cannot be edited; replace the open one.
                self.remove(ctx, &pending).await?;
                self.invite(ctx, &planned).await
            },
        }
    }

    async fn delete(&self, ctx: &ResourceContext, current: TeammateState) -> Result<(), ProviderError> {
        let email = require_id(&current.id, "teammate")?;
        match Self::find(ctx, email).await? {
            Some(observed) => self.remove(ctx, &observed).await,
            None => Ok(()),
        }
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<TeammateState, ProviderError> {
        Self::find(ctx, id)
            .await?
            .map(|observed| TeammateState::default().observe(observed))
            .ok_or_else(|| ProviderError::NotFound(format!("teammate {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teammate(is_admin: bool, scopes: &[&str]) -> Teammate {
        Teammate {
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            user_type: if is_admin { "admin" } else { "teammate" }.to_string(),
            is_admin,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn desired(scopes: &[&str]) -> TeammateState {
        TeammateState {
            email: "jdoe@example.com".to_string(),
            scopes: Some(scopes.iter().map(|s| s.to_string()).collect()),
            subuser_access: Some(vec![SubuserAccess {
                id: 1001,
                permission_type: "restricted".to_string(),
                scopes: vec!["mail.send".to_string()],
            }]),
            has_restricted_subuser_access: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_observe_accepted_teammate() {
        let state = desired(&["mail.send"]).observe(Observed::Accepted(
            teammate(false, &["mail.send", "2fa_required"]),
            TeammateSubuserAccess::default(),
        ));

        assert_eq!(state.id.as_deref(), Some("jdoe@example.com"));
        assert_eq!(state.username.as_deref(), Some("jdoe"));
        assert_eq!(state.scopes, Some(vec!["mail.send".to_string()]));
        assert_eq!(state.is_pending, Some(false));
        // Access not echoed yet: configured value kept.
        assert_eq!(state.subuser_access.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_observe_admin_keeps_configured_scopes() {
        let mut wanted = desired(&[]);
        wanted.is_admin = Some(true);

        let state = wanted.observe(Observed::Accepted(
            teammate(true, &["mail.send", "templates.read", "user.profile.read"]),
            TeammateSubuserAccess::default(),
        ));

        assert_eq!(state.scopes, Some(vec![]));
    }

    #[test]
    fn test_observe_pending_invitation() {
        let state = desired(&["mail.send"]).observe(Observed::Pending(PendingTeammate {
            email: "jdoe@example.com".to_string(),
            token: "tok-1".to_string(),
            scopes: vec!["mail.send".to_string()],
            is_admin: false,
            expiration_date: Some(1_700_000_000),
        }));

        assert_eq!(state.is_pending, Some(true));
        assert_eq!(state.token.as_deref(), Some("tok-1"));
        assert_eq!(state.username, None);
        assert_eq!(state.has_restricted_subuser_access, Some(true));
    }
}
