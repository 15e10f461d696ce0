//! `/whitelabel` endpoints: domain authentication and link branding.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// A DNS record SendGrid asks the account owner to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Whether SendGrid found the record.
    #[serde(default)]
    pub valid: bool,
    /// Record type, e.g. `cname`.
    #[serde(rename = "type", default)]
    pub record_type: String,
    /// Record name.
    #[serde(default)]
    pub host: String,
    /// Record value.
    #[serde(default)]
    pub data: String,
}

/// Body for authenticating a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDomainRequest {
    /// Sending domain.
    pub domain: String,
    /// Subdomain used for the return path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Dedicated IPs to include in the SPF record.
    pub ips: Vec<String>,
    /// Manage SPF manually.
    pub custom_spf: bool,
    /// Use this domain by default.
    pub default: bool,
    /// Let SendGrid rotate DKIM keys through CNAMEs.
    pub automatic_security: bool,
    /// Custom DKIM selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_dkim_selector: Option<String>,
}

/// Body for updating an authenticated domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateDomainRequest {
    /// Use this domain by default.
    pub default: bool,
    /// Manage SPF manually.
    pub custom_spf: bool,
}

/// An authenticated domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainAuthentication {
    /// Domain id.
    pub id: i64,
    /// Sending domain.
    pub domain: String,
    /// Return-path subdomain.
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Associated IPs. Empty for a while after creation.
    #[serde(default)]
    pub ips: Vec<String>,
    /// Manual SPF.
    #[serde(default)]
    pub custom_spf: bool,
    /// Default domain.
    #[serde(default)]
    pub default: bool,
    /// Automatic DKIM rotation.
    #[serde(default)]
    pub automatic_security: bool,
    /// Whether all DNS records validated.
    #[serde(default)]
    pub valid: bool,
    /// DNS records keyed by purpose (`mail_cname`, `dkim1`, ...).
    #[serde(default)]
    pub dns: BTreeMap<String, DnsRecord>,
}

#[derive(Debug, Serialize)]
struct DomainIpRequest<'a> {
    ip: &'a str,
}

/// Body for creating a branded link domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateLinkRequest {
    /// Root domain.
    pub domain: String,
    /// Subdomain used for links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Use this branding by default.
    pub default: bool,
}

#[derive(Debug, Serialize)]
struct UpdateLinkRequest {
    default: bool,
}

/// A branded link domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkBranding {
    /// Link branding id.
    pub id: i64,
    /// Root domain.
    pub domain: String,
    /// Links subdomain.
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Default branding.
    #[serde(default)]
    pub default: bool,
    /// Whether all DNS records validated.
    #[serde(default)]
    pub valid: bool,
    /// DNS records keyed by purpose (`domain_cname`, `owner_cname`).
    #[serde(default)]
    pub dns: BTreeMap<String, DnsRecord>,
}

impl SendgridClient {
    /// `POST /whitelabel/domains`
    pub async fn create_domain_authentication(
        &self,
        request: &CreateDomainRequest,
    ) -> Result<DomainAuthentication, ApiError> {
        self.send(Method::POST, "whitelabel/domains", request).await
    }

    /// `GET /whitelabel/domains/{id}`
    pub async fn get_domain_authentication(&self, id: i64) -> Result<DomainAuthentication, ApiError> {
        self.get(Endpoint::new("whitelabel/domains").param(id)).await
    }

    /// `PATCH /whitelabel/domains/{id}`
    pub async fn update_domain_authentication(
        &self,
        id: i64,
        request: &UpdateDomainRequest,
    ) -> Result<DomainAuthentication, ApiError> {
        self.send(Method::PATCH, Endpoint::new("whitelabel/domains").param(id), request)
            .await
    }

    /// `POST /whitelabel/domains/{id}/ips`
    pub async fn add_domain_ip(&self, id: i64, ip: &str) -> Result<(), ApiError> {
        self.send_discard(
            Method::POST,
            Endpoint::new("whitelabel/domains").param(id).join("ips"),
            &DomainIpRequest { ip },
        )
        .await
    }

    /// `DELETE /whitelabel/domains/{id}/ips/{ip}`
    pub async fn remove_domain_ip(&self, id: i64, ip: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("whitelabel/domains").param(id).join("ips").param(ip))
            .await
    }

    /// `DELETE /whitelabel/domains/{id}`
    pub async fn delete_domain_authentication(&self, id: i64) -> Result<(), ApiError> {
        self.delete(Endpoint::new("whitelabel/domains").param(id)).await
    }

    /// `POST /whitelabel/links`
    pub async fn create_link_branding(
        &self,
        request: &CreateLinkRequest,
    ) -> Result<LinkBranding, ApiError> {
        self.send(Method::POST, "whitelabel/links", request).await
    }

    /// `GET /whitelabel/links/{id}`
    pub async fn get_link_branding(&self, id: i64) -> Result<LinkBranding, ApiError> {
        self.get(Endpoint::new("whitelabel/links").param(id)).await
    }

    /// `PATCH /whitelabel/links/{id}`
    pub async fn set_link_branding_default(
        &self,
        id: i64,
        default: bool,
    ) -> Result<LinkBranding, ApiError> {
        self.send(
            Method::PATCH,
            Endpoint::new("whitelabel/links").param(id),
            &UpdateLinkRequest { default },
        )
        .await
    }

    /// `DELETE /whitelabel/links/{id}`
    pub async fn delete_link_branding(&self, id: i64) -> Result<(), ApiError> {
        self.delete(Endpoint::new("whitelabel/links").param(id)).await
    }
}
