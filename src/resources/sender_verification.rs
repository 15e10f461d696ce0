//! `sendgrid_sender_verification`
//!
//! Creating a sender makes SendGrid mail a verification link to
//! `from_email`. `verified` stays false until the link is followed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{numeric_id, require_id, Resource, ResourceContext};
use crate::client::senders::{SenderIdentity, VerifiedSender};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_sender_verification`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderVerificationState {
    /// Sender id.
    pub id: Option<String>,
    /// Label for the sender.
    pub nickname: String,
    /// From address.
    pub from_email: String,
    /// From display name.
    pub from_name: Option<String>,
    /// Reply-to address.
    pub reply_to: String,
    /// Reply-to display name.
    pub reply_to_name: Option<String>,
    /// Street address.
    pub address: String,
    /// Second address line.
    pub address2: Option<String>,
    /// City.
    pub city: String,
    /// State or region.
    pub state: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
    /// Country.
    pub country: String,
    /// Whether `from_email` has been verified.
    pub verified: Option<bool>,
    /// Whether SendGrid locked the sender against edits.
    pub locked: Option<bool>,
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

impl SenderVerificationState {
    fn identity(&self) -> SenderIdentity {
        SenderIdentity {
            nickname: self.nickname.clone(),
            from_email: self.from_email.clone(),
            from_name: self.from_name.clone().unwrap_or_default(),
            reply_to: self.reply_to.clone(),
            reply_to_name: self.reply_to_name.clone().unwrap_or_default(),
            address: self.address.clone(),
            address2: self.address2.clone().unwrap_or_default(),
            city: self.city.clone(),
            state: self.state.clone().unwrap_or_default(),
            zip: self.zip.clone().unwrap_or_default(),
            country: self.country.clone(),
        }
    }
}

impl From<VerifiedSender> for SenderVerificationState {
    fn from(sender: VerifiedSender) -> Self {
        let identity = sender.identity;
        Self {
            id: Some(sender.id.to_string()),
            nickname: identity.nickname,
            from_email: identity.from_email,
            from_name: non_empty(identity.from_name),
            reply_to: identity.reply_to,
            reply_to_name: non_empty(identity.reply_to_name),
            address: identity.address,
            address2: non_empty(identity.address2),
            city: identity.city,
            state: non_empty(identity.state),
            zip: non_empty(identity.zip),
            country: identity.country,
            verified: Some(sender.verified),
            locked: Some(sender.locked),
        }
    }
}

/// Manages a single sender identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderVerificationResource;

#[async_trait]
impl Resource for SenderVerificationResource {
    type State = SenderVerificationState;

    fn type_name(&self) -> &'static str {
        "sendgrid_sender_verification"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A verified single sender identity.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("nickname", Attribute::required_string())
            .with_attribute("from_email", Attribute::required_string())
            .with_attribute("from_name", Attribute::optional_string())
            .with_attribute("reply_to", Attribute::required_string())
            .with_attribute("reply_to_name", Attribute::optional_string())
            .with_attribute("address", Attribute::required_string())
            .with_attribute("address2", Attribute::optional_string())
            .with_attribute("city", Attribute::required_string())
            .with_attribute("state", Attribute::optional_string())
            .with_attribute("zip", Attribute::optional_string())
            .with_attribute("country", Attribute::required_string())
            .with_attribute("verified", Attribute::computed_bool())
            .with_attribute("locked", Attribute::computed_bool())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: SenderVerificationState,
    ) -> Result<SenderVerificationState, ProviderError> {
        let client = ctx.client();
        let identity = planned.identity();
        let sender = ctx
            .call("creating sender identity", || {
                client.create_verified_sender(&identity)
            })
            .await?;
        Ok(sender.into())
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: SenderVerificationState,
    ) -> Result<Option<SenderVerificationState>, ProviderError> {
        let id = numeric_id(require_id(&current.id, "sender identity")?, "sender identity")?;
        let client = ctx.client();
        let sender = ctx
            .call_optional("reading sender identity", || {
                client.get_verified_sender(id)
            })
            .await?;
        Ok(sender.map(Into::into))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: SenderVerificationState,
        planned: SenderVerificationState,
    ) -> Result<SenderVerificationState, ProviderError> {
        let id = numeric_id(require_id(&prior.id, "sender identity")?, "sender identity")?;
        if prior.locked == Some(true) {
            return Err(ProviderError::Validation(format!(
                "sender identity {} is locked and cannot be changed",
                id
            )));
        }
        let client = ctx.client();
        let identity = planned.identity();
        let sender = ctx
            .call("updating sender identity", || {
                client.update_verified_sender(id, &identity)
            })
            .await?;
        Ok(sender.into())
    }

    async fn delete(
        &self,
        ctx: &ResourceContext,
        current: SenderVerificationState,
    ) -> Result<(), ProviderError> {
        let id = numeric_id(require_id(&current.id, "sender identity")?, "sender identity")?;
        let client = ctx.client();
        ctx.call("deleting sender identity", || {
            client.delete_verified_sender(id)
        })
        .await
    }

    async fn import(
        &self,
        ctx: &ResourceContext,
        id: &str,
    ) -> Result<SenderVerificationState, ProviderError> {
        let id = numeric_id(id, "sender identity")?;
        let client = ctx.client();
        let sender = ctx
            .call("importing sender identity", || client.get_verified_sender(id))
            .await?;
        Ok(sender.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_optional_fields_become_unset() {
        let state = SenderVerificationState::from(VerifiedSender {
            id: 5,
            identity: SenderIdentity {
                nickname: "support".to_string(),
                from_email: "support@example.com".to_string(),
                from_name: "Support".to_string(),
                reply_to: "support@example.com".to_string(),
                address: "1 Main St".to_string(),
                city: "Denver".to_string(),
                country: "USA".to_string(),
                ..Default::default()
            },
            verified: false,
            locked: false,
        });

        assert_eq!(state.id.as_deref(), Some("5"));
        assert_eq!(state.from_name.as_deref(), Some("Support"));
        assert_eq!(state.address2, None);
        assert_eq!(state.zip, None);
        assert_eq!(state.identity().zip, "");
    }
}
