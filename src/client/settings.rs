//! Account-wide settings that exist exactly once per account.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, SendgridClient};

/// `/user/settings/enforced_tls` payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcedTls {
    /// Refuse to deliver to recipients that do not support TLS.
    #[serde(default)]
    pub require_tls: bool,
    /// Also require a valid certificate.
    #[serde(default)]
    pub require_valid_cert: bool,
}

impl SendgridClient {
    /// `GET /user/settings/enforced_tls`
    pub async fn get_enforced_tls(&self) -> Result<EnforcedTls, ApiError> {
        self.get("user/settings/enforced_tls").await
    }

    /// `PATCH /user/settings/enforced_tls`
    pub async fn update_enforced_tls(&self, settings: &EnforcedTls) -> Result<EnforcedTls, ApiError> {
        self.send(Method::PATCH, "user/settings/enforced_tls", settings)
            .await
    }
}
