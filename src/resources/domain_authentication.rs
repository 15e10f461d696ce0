//! `sendgrid_domain_authentication`

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{numeric_id, require_id, Resource, ResourceContext};
use crate::client::whitelabel::{
    CreateDomainRequest, DnsRecord, DomainAuthentication, UpdateDomainRequest,
};
use crate::error::ProviderError;
use crate::reconcile::reconcile_ips;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// The computed `dns` attribute shared by the whitelabel resources.
pub(crate) fn dns_attribute() -> Attribute {
    let record = AttributeType::object([
        ("valid", AttributeType::Bool),
        ("type", AttributeType::String),
        ("host", AttributeType::String),
        ("data", AttributeType::String),
    ]);
    Attribute::new(AttributeType::map(record), AttributeFlags::computed())
        .with_description("DNS records to publish, keyed by purpose.")
}

/// State of a `sendgrid_domain_authentication`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainAuthenticationState {
    /// Domain id.
    pub id: Option<String>,
    /// Sending domain.
    pub domain: String,
    /// Return-path subdomain.
    pub subdomain: Option<String>,
    /// Manage SPF manually.
    pub custom_spf: Option<bool>,
    /// Let SendGrid rotate DKIM keys.
    pub automatic_security: Option<bool>,
    /// Custom DKIM selector.
    pub custom_dkim_selector: Option<String>,
    /// Dedicated IPs.
    pub ips: Option<Vec<String>>,
    /// Use this domain by default.
    pub is_default: Option<bool>,
    /// Whether all DNS records validated.
    pub valid: Option<bool>,
    /// DNS records to publish.
    pub dns: Option<BTreeMap<String, DnsRecord>>,
}

impl DomainAuthenticationState {
    fn observe(&self, domain: DomainAuthentication) -> Self {
        let desired_ips = self.ips.as_deref().unwrap_or_default();
        Self {
            id: Some(domain.id.to_string()),
            domain: domain.domain,
            subdomain: domain.subdomain.filter(|s| !s.is_empty()).or_else(|| self.subdomain.clone()),
            custom_spf: Some(domain.custom_spf),
            automatic_security: Some(domain.automatic_security),
            custom_dkim_selector: self.custom_dkim_selector.clone(),
            ips: Some(reconcile_ips(desired_ips, &domain.ips)),
            is_default: Some(domain.default),
            valid: Some(domain.valid),
            dns: Some(domain.dns),
        }
    }
}

/// Manages an authenticated sending domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainAuthenticationResource;

#[async_trait]
impl Resource for DomainAuthenticationResource {
    type State = DomainAuthenticationState;

    fn type_name(&self) -> &'static str {
        "sendgrid_domain_authentication"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A domain authenticated for sending (SPF and DKIM).")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("domain", Attribute::required_string().with_force_new())
            .with_attribute(
                "subdomain",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Return-path subdomain. SendGrid picks one when unset."),
            )
            .with_attribute(
                "custom_spf",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute(
                "automatic_security",
                Attribute::optional_bool()
                    .with_default(json!(true))
                    .with_force_new(),
            )
            .with_attribute(
                "custom_dkim_selector",
                Attribute::optional_string().with_force_new(),
            )
            .with_attribute("ips", Attribute::optional_string_set())
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
        planned: DomainAuthenticationState,
    ) -> Result<DomainAuthenticationState, ProviderError> {
        let client = ctx.client();
        let request = CreateDomainRequest {
            domain: planned.domain.clone(),
            subdomain: planned.subdomain.clone(),
            ips: planned.ips.clone().unwrap_or_default(),
            custom_spf: planned.custom_spf.unwrap_or(false),
            default: planned.is_default.unwrap_or(false),
            automatic_security: planned.automatic_security.unwrap_or(true),
            custom_dkim_selector: planned.custom_dkim_selector.clone(),
        };
        let domain = ctx
            .call("authenticating domain", || {
                client.create_domain_authentication(&request)
            })
            .await?;
        Ok(planned.observe(domain))
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: DomainAuthenticationState,
    ) -> Result<Option<DomainAuthenticationState>, ProviderError> {
        let id = numeric_id(require_id(&current.id, "domain authentication")?, "domain authentication")?;
        let client = ctx.client();
        let domain = ctx
            .call_optional("reading domain authentication", || {
                client.get_domain_authentication(id)
            })
            .await?;
        Ok(domain.map(|domain| current.observe(domain)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: DomainAuthenticationState,
        planned: DomainAuthenticationState,
    ) -> Result<DomainAuthenticationState, ProviderError> {
        let id = numeric_id(require_id(&prior.id, "domain authentication")?, "domain authentication")?;
        let client = ctx.client();

        let before: BTreeSet<&String> = prior.ips.iter().flatten().collect();
        let after: BTreeSet<&String> = planned.ips.iter().flatten().collect();
        for ip in after.difference(&before) {
            ctx.call("adding IP to authenticated domain", || {
                client.add_domain_ip(id, ip)
            })
            .await?;
        }
        for ip in before.difference(&after) {
            ctx.call("removing IP from authenticated domain", || {
                client.remove_domain_ip(id, ip)
            })
            .await?;
        }

        let request = UpdateDomainRequest {
            default: planned.is_default.unwrap_or(false),
            custom_spf: planned.custom_spf.unwrap_or(false),
        };
        let domain = ctx
            .call("updating domain authentication", || {
                client.update_domain_authentication(id, &request)
            })
            .await?;
        Ok(planned.observe(domain))
    }

    async fn delete(
        &self,
        ctx: &ResourceContext,
        current: DomainAuthenticationState,
    ) -> Result<(), ProviderError> {
        let id = numeric_id(require_id(&current.id, "domain authentication")?, "domain authentication")?;
        let client = ctx.client();
        ctx.call("deleting domain authentication", || {
            client.delete_domain_authentication(id)
        })
        .await
    }

    async fn import(
        &self,
        ctx: &ResourceContext,
        id: &str,
    ) -> Result<DomainAuthenticationState, ProviderError> {
        let id = numeric_id(id, "domain authentication")?;
        let client = ctx.client();
        let domain = ctx
            .call("importing domain authentication", || {
                client.get_domain_authentication(id)
            })
            .await?;
        Ok(DomainAuthenticationState::default().observe(domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn domain(ips: &[&str]) -> DomainAuthentication {
        let mut dns = BTreeMap::new();
        dns.insert(
            "mail_cname".to_string(),
            DnsRecord {
                valid: false,
                record_type: "cname".to_string(),
                host: "em123.example.com".to_string(),
                data: "u123.wl.sendgrid.net".to_string(),
            },
        );
        DomainAuthentication {
            id: 7,
            domain: "example.com".to_string(),
            subdomain: Some("em123".to_string()),
            ips: ips.iter().map(|s| s.to_string()).collect(),
            custom_spf: false,
            default: false,
            automatic_security: true,
            valid: false,
            dns,
        }
    }

    #[test]
    fn test_observe_keeps_ips_while_sendgrid_reports_none() {
        let desired = DomainAuthenticationState {
            domain: "example.com".to_string(),
            ips: Some(vec!["10.0.0.1".to_string()]),
            ..Default::default()
        };

        let state = desired.observe(domain(&[]));

        assert_eq!(state.id.as_deref(), Some("7"));
        assert_eq!(state.ips, Some(vec!["10.0.0.1".to_string()]));
        assert_eq!(state.subdomain.as_deref(), Some("em123"));
        assert_eq!(state.dns.as_ref().map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_dns_state_serializes_record_type() {
        let state = DomainAuthenticationState::default().observe(domain(&["10.0.0.2"]));
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["dns"]["mail_cname"]["type"], "cname");
        assert_eq!(value["ips"], json!(["10.0.0.2"]));
    }

    #[test]
    fn test_dns_is_not_configurable() {
        let schema = Resource::schema(&DomainAuthenticationResource);
        let diagnostics = validate(&schema, &json!({"domain": "example.com", "dns": {}}));
        assert!(diagnostics.is_empty(), "computed attributes are ignored: {:?}", diagnostics);
    }
}
