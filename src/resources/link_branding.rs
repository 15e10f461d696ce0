//! `sendgrid_link_branding`

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain_authentication::dns_attribute;
use super::{numeric_id, require_id, Resource, ResourceContext};
use crate::client::whitelabel::{CreateLinkRequest, DnsRecord, LinkBranding};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_link_branding`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkBrandingState {
    /// Link branding id.
    pub id: Option<String>,
    /// Root domain.
    pub domain: String,
    /// Links subdomain.
    pub subdomain: Option<String>,
    /// Use this branding by default.
    pub is_default: Option<bool>,
    /// Whether all DNS records validated.
    pub valid: Option<bool>,
    /// DNS records to publish.
    pub dns: Option<BTreeMap<String, DnsRecord>>,
}

impl LinkBrandingState {
    fn observe(&self, link: LinkBranding) -> Self {
        Self {
            id: Some(link.id.to_string()),
            domain: link.domain,
            subdomain: link.subdomain.filter(|s| !s.is_empty()).or_else(|| self.subdomain.clone()),
            is_default: Some(link.default),
            valid: Some(link.valid),
            dns: Some(link.dns),
        }
    }
}

/// Manages a branded link domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkBrandingResource;

#[async_trait]
impl Resource for LinkBrandingResource {
    type State = LinkBrandingState;

    fn type_name(&self) -> &'static str {
        "sendgrid_link_branding"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Branded click-tracking links.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("domain", Attribute::required_string().with_force_new())
            .with_attribute("subdomain", Attribute::optional_string().with_force_new())
            .with_attribute(
                "is_default",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("valid", Attribute::computed_bool())
            .with_attribute("dns", dns_attribute())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: LinkBrandingState,
    ) -> Result<LinkBrandingState, ProviderError> {
        let client = ctx.client();
        let request = CreateLinkRequest {
            domain: planned.domain.clone(),
            subdomain: planned.subdomain.clone(),
            default: planned.is_default.unwrap_or(false),
        };
        let link = ctx
            .call("creating link branding", || client.create_link_branding(&request))
            .await?;
        Ok(planned.observe(link))
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: LinkBrandingState,
    ) -> Result<Option<LinkBrandingState>, ProviderError> {
        let id = numeric_id(require_id(&current.id, "link branding")?, "link branding")?;
        let client = ctx.client();
        let link = ctx
            .call_optional("reading link branding", || client.get_link_branding(id))
            .await?;
        Ok(link.map(|link| current.observe(link)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: LinkBrandingState,
        planned: LinkBrandingState,
    ) -> Result<LinkBrandingState, ProviderError> {
        let id = numeric_id(require_id(&prior.id, "link branding")?, "link branding")?;
        let client = ctx.client();
        let default = planned.is_default.unwrap_or(false);
        let link = ctx
            .call("updating link branding", || {
                client.set_link_branding_default(id, default)
            })
            .await?;
        Ok(planned.observe(link))
    }

    async fn delete(&self, ctx: &ResourceContext, current: LinkBrandingState) -> Result<(), ProviderError> {
        let id = numeric_id(require_id(&current.id, "link branding")?, "link branding")?;
        let client = ctx.client();
        ctx.call("deleting link branding", || client.delete_link_branding(id))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<LinkBrandingState, ProviderError> {
        let id = numeric_id(id, "link branding")?;
        let client = ctx.client();
        let link = ctx
            .call("importing link branding", || client.get_link_branding(id))
            .await?;
        Ok(LinkBrandingState::default().observe(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe() {
        let state = LinkBrandingState::default().observe(LinkBranding {
            id: 12,
            domain: "example.com".to_string(),
            subdomain: Some("links".to_string()),
            default: true,
            valid: false,
            dns: BTreeMap::new(),
        });

        assert_eq!(state.id.as_deref(), Some("12"));
        assert_eq!(state.subdomain.as_deref(), Some("links"));
        assert_eq!(state.is_default, Some(true));
        assert_eq!(state.valid, Some(false));
    }

    #[test]
    fn test_only_default_flag_updates_in_place() {
        let schema = Resource::schema(&LinkBrandingResource);
        assert!(schema.attribute("domain").unwrap().force_new);
        assert!(schema.attribute("subdomain").unwrap().force_new);
        assert!(!schema.attribute("is_default").unwrap().force_new);
    }
}
