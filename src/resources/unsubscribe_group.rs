//! `sendgrid_unsubscribe_group`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{numeric_id, require_id, Resource, ResourceContext};
use crate::client::unsubscribe_groups::{UnsubscribeGroup, UnsubscribeGroupRequest};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_unsubscribe_group`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsubscribeGroupState {
    /// Group id.
    pub id: Option<String>,
    /// Name shown to recipients.
    pub name: String,
    /// Description shown to recipients.
    pub description: Option<String>,
    /// Whether new sends use this group by default.
    pub is_default: Option<bool>,
    /// Number of unsubscribed addresses.
    pub unsubscribes: Option<i64>,
}

impl UnsubscribeGroupState {
    fn request(&self) -> UnsubscribeGroupRequest {
        UnsubscribeGroupRequest {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            is_default: self.is_default.unwrap_or(false),
        }
    }
}

impl From<UnsubscribeGroup> for UnsubscribeGroupState {
    fn from(group: UnsubscribeGroup) -> Self {
        Self {
            id: Some(group.id.to_string()),
            name: group.name,
            description: Some(group.description),
            is_default: Some(group.is_default),
            unsubscribes: Some(group.unsubscribes),
        }
    }
}

/// Manages an unsubscribe (suppression) group.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsubscribeGroupResource;

#[async_trait]
impl Resource for UnsubscribeGroupResource {
    type State = UnsubscribeGroupState;

    fn type_name(&self) -> &'static str {
        "sendgrid_unsubscribe_group"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A group recipients can unsubscribe from.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name shown to recipients."),
            )
            .with_attribute(
                "description",
                Attribute::optional_string()
                    .with_default(serde_json::json!(""))
                    .with_description("Description shown to recipients."),
            )
            .with_attribute(
                "is_default",
                Attribute::optional_bool().with_default(serde_json::json!(false)),
            )
            .with_attribute("unsubscribes", Attribute::computed_int64())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: UnsubscribeGroupState,
    ) -> Result<UnsubscribeGroupState, ProviderError> {
        let client = ctx.client();
        let request = planned.request();
        let group = ctx
            .call("creating unsubscribe group", || {
                client.create_unsubscribe_group(&request)
            })
            .await?;
        Ok(group.into())
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: UnsubscribeGroupState,
    ) -> Result<Option<UnsubscribeGroupState>, ProviderError> {
        let id = numeric_id(require_id(&current.id, "unsubscribe group")?, "unsubscribe group")?;
        let client = ctx.client();
        let group = ctx
            .call_optional("reading unsubscribe group", || {
                client.get_unsubscribe_group(id)
            })
            .await?;
        Ok(group.map(Into::into))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: UnsubscribeGroupState,
        planned: UnsubscribeGroupState,
    ) -> Result<UnsubscribeGroupState, ProviderError> {
        let id = numeric_id(require_id(&prior.id, "unsubscribe group")?, "unsubscribe group")?;
        let client = ctx.client();
        let request = planned.request();
        let group = ctx
            .call("updating unsubscribe group", || {
                client.update_unsubscribe_group(id, &request)
            })
            .await?;
        Ok(group.into())
    }

    async fn delete(
        &self,
        ctx: &ResourceContext,
        current: UnsubscribeGroupState,
    ) -> Result<(), ProviderError> {
        let id = numeric_id(require_id(&current.id, "unsubscribe group")?, "unsubscribe group")?;
        let client = ctx.client();
        ctx.call("deleting unsubscribe group", || {
            client.delete_unsubscribe_group(id)
        })
        .await
    }

    async fn import(
        &self,
        ctx: &ResourceContext,
        id: &str,
    ) -> Result<UnsubscribeGroupState, ProviderError> {
        let id = numeric_id(id, "unsubscribe group")?;
        let client = ctx.client();
        let group = ctx
            .call("importing unsubscribe group", || {
                client.get_unsubscribe_group(id)
            })
            .await?;
        Ok(group.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_request() {
        let state = UnsubscribeGroupState::from(UnsubscribeGroup {
            id: 42,
            name: "Newsletter".to_string(),
            description: "Weekly news".to_string(),
            is_default: true,
            unsubscribes: 3,
        });

        assert_eq!(state.id.as_deref(), Some("42"));
        assert_eq!(state.unsubscribes, Some(3));

        let request = state.request();
        assert_eq!(request.description, "Weekly news");
        assert!(request.is_default);
    }

    #[test]
    fn test_unset_fields_are_sent_as_defaults() {
        let request = UnsubscribeGroupState {
            name: "Newsletter".to_string(),
            ..Default::default()
        }
        .request();

        assert_eq!(request.description, "");
        assert!(!request.is_default);
    }
}
