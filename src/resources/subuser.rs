//! `sendgrid_subuser`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_id, Resource, ResourceContext};
use crate::client::subusers::{CreateSubuserRequest, Subuser};
use crate::error::ProviderError;
use crate::reconcile::{reconcile_ips, reconcile_write_only};
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_subuser`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubuserState {
    /// Same as `username`.
    pub id: Option<String>,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Initial password. Never read back.
    pub password: Option<String>,
    /// Assigned sending IPs.
    pub ips: Option<Vec<String>>,
    /// Whether the subuser is disabled.
    pub disabled: Option<bool>,
    /// Numeric user id.
    pub user_id: Option<i64>,
}

impl SubuserState {
    fn observe(&self, subuser: Subuser, ips: Vec<String>) -> Self {
        let desired_ips = self.ips.as_deref().unwrap_or_default();
        Self {
            id: Some(subuser.username.clone()),
            username: subuser.username,
            email: subuser.email,
            password: reconcile_write_only(self.password.clone(), None),
            ips: Some(reconcile_ips(desired_ips, &ips)),
            disabled: Some(subuser.disabled),
            user_id: Some(subuser.id),
        }
    }
}

/// Manages a subuser account.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubuserResource;

impl SubuserResource {
    async fn fetch(
        &self,
        ctx: &ResourceContext,
        username: &str,
    ) -> Result<Option<(Subuser, Vec<String>)>, ProviderError> {
        let client = ctx.client();
        let Some(subuser) = ctx
            .call_optional("reading subuser", || client.get_subuser(username))
            .await?
        else {
            return Ok(None);
        };
        let ips = ctx
            .call("reading subuser IPs", || client.list_subuser_ips(username))
            .await?;
        Ok(Some((subuser, ips)))
    }

    async fn set_disabled(
        &self,
        ctx: &ResourceContext,
        username: &str,
        disabled: bool,
    ) -> Result<(), ProviderError> {
        let client = ctx.client();
        let operation = if disabled {
            "disabling subuser"
        } else {
            "enabling subuser"
        };
        ctx.call(operation, || client.set_subuser_disabled(username, disabled))
            .await
    }

    async fn refresh(
        &self,
        ctx: &ResourceContext,
        desired: &SubuserState,
        username: &str,
    ) -> Result<SubuserState, ProviderError> {
        let (subuser, ips) = self
            .fetch(ctx, username)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("subuser {}", username)))?;
        Ok(desired.observe(subuser, ips))
    }
}

#[async_trait]
impl Resource for SubuserResource {
    type State = SubuserState;

    fn type_name(&self) -> &'static str {
        "sendgrid_subuser"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A subuser account under the parent account.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("username", Attribute::required_string().with_force_new())
            .with_attribute("email", Attribute::required_string().with_force_new())
            .with_attribute(
                "password",
                Attribute::required_string().sensitive().with_force_new(),
            )
            .with_attribute(
                "ips",
                Attribute::optional_string_list().with_description("Sending IPs of the subuser."),
            )
            .with_attribute(
                "disabled",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("user_id", Attribute::computed_int64())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: SubuserState,
    ) -> Result<SubuserState, ProviderError> {
        let client = ctx.client();
        let request = CreateSubuserRequest {
            username: planned.username.clone(),
            email: planned.email.clone(),
            password: planned.password.clone().unwrap_or_default(),
            ips: planned.ips.clone().unwrap_or_default(),
        };
        let created = ctx
            .call("creating subuser", || client.create_subuser(&request))
            .await?;

        if planned.disabled.unwrap_or(false) {
            self.set_disabled(ctx, &created.username, true).await?;
        }

        self.refresh(ctx, &planned, &created.username).await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: SubuserState,
    ) -> Result<Option<SubuserState>, ProviderError> {
        let username = require_id(&current.id, "subuser")?;
        Ok(self
            .fetch(ctx, username)
            .await?
            .map(|(subuser, ips)| current.observe(subuser, ips)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: SubuserState,
        planned: SubuserState,
    ) -> Result<SubuserState, ProviderError> {
        let username = require_id(&prior.id, "subuser")?;
        let client = ctx.client();

        if let Some(ips) = planned.ips.as_deref().filter(|ips| Some(*ips) != prior.ips.as_deref()) {
            ctx.call("assigning subuser IPs", || client.set_subuser_ips(username, ips))
                .await?;
        }

        let disabled = planned.disabled.unwrap_or(false);
        if Some(disabled) != prior.disabled {
            self.set_disabled(ctx, username, disabled).await?;
        }

        self.refresh(ctx, &planned, username).await
    }

    async fn delete(&self, ctx: &ResourceContext, current: SubuserState) -> Result<(), ProviderError> {
        let username = require_id(&current.id, "subuser")?;
        let client = ctx.client();
        ctx.call("deleting subuser", || client.delete_subuser(username))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<SubuserState, ProviderError> {
        self.refresh(ctx, &SubuserState::default(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subuser() -> Subuser {
        Subuser {
            id: 1001,
            username: "marketing".to_string(),
            email: "marketing@example.com".to_string(),
            disabled: false,
        }
    }

    #[test]
    fn test_observe_keeps_password_and_fresh_ips() {
        let desired = SubuserState {
            username: "marketing".to_string(),
            email: "marketing@example.com".to_string(),
            password: Some("hunter22!".to_string()),
            ips: Some(vec!["10.0.0.1".to_string()]),
            ..Default::default()
        };

        let state = desired.observe(subuser(), vec![]);

        assert_eq!(state.id.as_deref(), Some("marketing"));
        assert_eq!(state.password.as_deref(), Some("hunter22!"));
        assert_eq!(state.ips, Some(vec!["10.0.0.1".to_string()]));
        assert_eq!(state.user_id, Some(1001));
        assert_eq!(state.disabled, Some(false));
    }

    #[test]
    fn test_observe_reports_remote_ips() {
        let state = SubuserState::default().observe(subuser(), vec!["10.0.0.2".to_string()]);
        assert_eq!(state.ips, Some(vec!["10.0.0.2".to_string()]));
        assert_eq!(state.password, None);
    }
}
