//! `/templates` and `/templates/{id}/versions` endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, Endpoint, SendgridClient};

/// Body for creating a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTemplateRequest {
    /// Template name.
    pub name: String,
    /// `legacy` or `dynamic`.
    pub generation: String,
}

/// Body for renaming a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTemplateRequest {
    /// Template name.
    pub name: String,
}

/// A transactional template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Template {
    /// Template id.
    pub id: String,
    /// Template name.
    pub name: String,
    /// `legacy` or `dynamic`.
    #[serde(default)]
    pub generation: String,
    /// Last modification time as reported by SendGrid.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Versions of the template.
    #[serde(default)]
    pub versions: Vec<TemplateVersion>,
}

/// Body for creating or updating a template version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateVersionRequest {
    /// Version name.
    pub name: String,
    /// `1` makes this the active version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<i64>,
    /// Subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    /// Plain text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_content: Option<String>,
    /// Derive the plain text body from the HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_plain_content: Option<bool>,
    /// `code` or `design`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    /// JSON test data for dynamic templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
}

/// A template version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateVersion {
    /// Version id.
    pub id: String,
    /// Owning template.
    pub template_id: String,
    /// Version name.
    #[serde(default)]
    pub name: String,
    /// `1` when this is the active version.
    #[serde(default)]
    pub active: i64,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub html_content: Option<String>,
    /// Plain text body.
    #[serde(default)]
    pub plain_content: Option<String>,
    /// Whether the plain text body is derived.
    #[serde(default)]
    pub generate_plain_content: bool,
    /// `code` or `design`.
    #[serde(default)]
    pub editor: Option<String>,
    /// JSON test data.
    #[serde(default)]
    pub test_data: Option<String>,
    /// Last modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Preview image.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl SendgridClient {
    /// `POST /templates`
    pub async fn create_template(
        &self,
        request: &CreateTemplateRequest,
    ) -> Result<Template, ApiError> {
        self.send(Method::POST, "templates", request).await
    }

    /// `GET /templates/{id}`
    pub async fn get_template(&self, id: &str) -> Result<Template, ApiError> {
        self.get(Endpoint::new("templates").param(id)).await
    }

    /// `PATCH /templates/{id}`
    pub async fn update_template(
        &self,
        id: &str,
        request: &UpdateTemplateRequest,
    ) -> Result<Template, ApiError> {
        self.send(Method::PATCH, Endpoint::new("templates").param(id), request)
            .await
    }

    /// `DELETE /templates/{id}`
    pub async fn delete_template(&self, id: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("templates").param(id)).await
    }

    /// `POST /templates/{template_id}/versions`
    pub async fn create_template_version(
        &self,
        template_id: &str,
        request: &TemplateVersionRequest,
    ) -> Result<TemplateVersion, ApiError> {
        self.send(
            Method::POST,
            Endpoint::new("templates").param(template_id).join("versions"),
            request,
        )
        .await
    }

    /// `GET /templates/{template_id}/versions/{id}`
    pub async fn get_template_version(
        &self,
        template_id: &str,
        id: &str,
    ) -> Result<TemplateVersion, ApiError> {
        self.get(Endpoint::new("templates").param(template_id).join("versions").param(id))
            .await
    }

    /// `PATCH /templates/{template_id}/versions/{id}`
    pub async fn update_template_version(
        &self,
        template_id: &str,
        id: &str,
        request: &TemplateVersionRequest,
    ) -> Result<TemplateVersion, ApiError> {
        self.send(
            Method::PATCH,
            Endpoint::new("templates").param(template_id).join("versions").param(id),
            request,
        )
        .await
    }

    /// `DELETE /templates/{template_id}/versions/{id}`
    pub async fn delete_template_version(&self, template_id: &str, id: &str) -> Result<(), ApiError> {
        self.delete(Endpoint::new("templates").param(template_id).join("versions").param(id))
            .await
    }
}
