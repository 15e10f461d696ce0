//! `sendgrid_template_version`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_id, Resource, ResourceContext};
use crate::client::templates::{TemplateVersion, TemplateVersionRequest};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// State of a `sendgrid_template_version`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateVersionState {
    /// Version id.
    pub id: Option<String>,
    /// Owning template.
    pub template_id: String,
    /// Version name.
    pub name: String,
    /// Subject line.
    pub subject: Option<String>,
    /// HTML body.
    pub html_content: Option<String>,
    /// Plain text body.
    pub plain_content: Option<String>,
    /// Derive the plain text body from the HTML body.
    pub generate_plain_content: Option<bool>,
    /// `code` or `design`.
    pub editor: Option<String>,
    /// `1` for the active version.
    pub active: Option<i64>,
    /// JSON test data.
    pub test_data: Option<String>,
    /// Last modification time.
    pub updated_at: Option<String>,
    /// Preview image.
    pub thumbnail_url: Option<String>,
}

impl TemplateVersionState {
    fn request(&self) -> TemplateVersionRequest {
        TemplateVersionRequest {
            name: self.name.clone(),
            active: Some(self.active.unwrap_or(1)),
            subject: self.subject.clone(),
            html_content: self.html_content.clone(),
            plain_content: self.plain_content.clone(),
            generate_plain_content: Some(self.generate_plain_content.unwrap_or(true)),
            editor: Some(self.editor.clone().unwrap_or_else(|| "code".to_string())),
            test_data: self.test_data.clone(),
        }
    }

    /// Merge what SendGrid reports into the configured state.
    ///
    /// A derived plain text body is SendGrid's, not the user's, so the
    /// configured value is kept while generation is on.
    pub(crate) fn observe(&self, version: TemplateVersion) -> Self {
        let plain_content = if version.generate_plain_content {
            self.plain_content.clone()
        } else {
            version.plain_content
        };
        Self {
            id: Some(version.id),
            template_id: version.template_id,
            name: version.name,
            subject: version.subject,
            html_content: version.html_content,
            plain_content,
            generate_plain_content: Some(version.generate_plain_content),
            editor: version.editor.or_else(|| self.editor.clone()),
            active: Some(version.active),
            test_data: version.test_data.or_else(|| self.test_data.clone()),
            updated_at: version.updated_at,
            thumbnail_url: version.thumbnail_url,
        }
    }
}

/// Split an import id of the form `template_id/version_id`.
pub(crate) fn parse_import_id(id: &str) -> Result<(&str, &str), ProviderError> {
    match id.split_once('/') {
        Some((template_id, version_id)) if !template_id.is_empty() && !version_id.is_empty() => {
            Ok((template_id, version_id))
        },
        _ => Err(ProviderError::Validation(format!(
            "template version import id must be 'template_id/version_id', got '{}'",
            id
        ))),
    }
}

/// Manages one version of a transactional template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVersionResource;

#[async_trait]
impl Resource for TemplateVersionResource {
    type State = TemplateVersionState;

    fn type_name(&self) -> &'static str {
        "sendgrid_template_version"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A version of a transactional template.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "template_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Template this version belongs to."),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("subject", Attribute::optional_string())
            .with_attribute("html_content", Attribute::optional_string())
            .with_attribute("plain_content", Attribute::optional_string())
            .with_attribute(
                "generate_plain_content",
                Attribute::optional_bool().with_default(json!(true)),
            )
            .with_attribute(
                "editor",
                Attribute::optional_string()
                    .with_default(json!("code"))
                    .with_description("`code` or `design`."),
            )
            .with_attribute(
                "active",
                Attribute::optional_int64()
                    .with_default(json!(1))
                    .with_description("`1` makes this the active version, `0` leaves it inactive."),
            )
            .with_attribute("test_data", Attribute::optional_string())
            .with_attribute("updated_at", Attribute::computed_string())
            .with_attribute("thumbnail_url", Attribute::computed_string())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: TemplateVersionState,
    ) -> Result<TemplateVersionState, ProviderError> {
        let client = ctx.client();
        let request = planned.request();
        let template_id = planned.template_id.as_str();
        let version = ctx
            .call("creating template version", || {
                client.create_template_version(template_id, &request)
            })
            .await?;
        Ok(planned.observe(version))
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: TemplateVersionState,
    ) -> Result<Option<TemplateVersionState>, ProviderError> {
        let id = require_id(&current.id, "template version")?;
        let client = ctx.client();
        let template_id = current.template_id.as_str();
        let version = ctx
            .call_optional("reading template version", || {
                client.get_template_version(template_id, id)
            })
            .await?;
        Ok(version.map(|version| current.observe(version)))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: TemplateVersionState,
        planned: TemplateVersionState,
    ) -> Result<TemplateVersionState, ProviderError> {
        let id = require_id(&prior.id, "template version")?;
        let client = ctx.client();
        let request = planned.request();
        let template_id = prior.template_id.as_str();
        let version = ctx
            .call("updating template version", || {
                client.update_template_version(template_id, id, &request)
            })
            .await?;
        Ok(planned.observe(version))
    }

    async fn delete(
        &self,
        ctx: &ResourceContext,
        current: TemplateVersionState,
    ) -> Result<(), ProviderError> {
        let id = require_id(&current.id, "template version")?;
        let client = ctx.client();
        let template_id = current.template_id.as_str();
        ctx.call("deleting template version", || {
            client.delete_template_version(template_id, id)
        })
        .await
    }

    async fn import(
        &self,
        ctx: &ResourceContext,
        id: &str,
    ) -> Result<TemplateVersionState, ProviderError> {
        let (template_id, version_id) = parse_import_id(id)?;
        let client = ctx.client();
        let version = ctx
            .call("importing template version", || {
                client.get_template_version(template_id, version_id)
            })
            .await?;
        Ok(TemplateVersionState::default().observe(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(generate_plain_content: bool) -> TemplateVersion {
        TemplateVersion {
            id: "v-1".to_string(),
            template_id: "d-1".to_string(),
            name: "first".to_string(),
            active: 1,
            subject: Some("Hello {{name}}".to_string()),
            html_content: Some("<p>Hi</p>".to_string()),
            plain_content: Some("Hi".to_string()),
            generate_plain_content,
            editor: Some("code".to_string()),
            test_data: None,
            updated_at: Some("2024-05-01 10:00:00".to_string()),
            thumbnail_url: None,
        }
    }

    #[test]
    fn test_parse_import_id() {
        assert_eq!(parse_import_id("d-1/v-2").unwrap(), ("d-1", "v-2"));
        assert!(parse_import_id("d-1").is_err());
        assert!(parse_import_id("/v-2").is_err());
        assert!(parse_import_id("d-1/").is_err());
    }

    #[test]
    fn test_request_applies_defaults() {
        let request = TemplateVersionState {
            template_id: "d-1".to_string(),
            name: "first".to_string(),
            ..Default::default()
        }
        .request();

        assert_eq!(request.active, Some(1));
        assert_eq!(request.generate_plain_content, Some(true));
        assert_eq!(request.editor.as_deref(), Some("code"));
    }

    #[test]
    fn test_observe_keeps_configured_plain_content_when_generated() {
        let current = TemplateVersionState {
            id: Some("v-1".to_string()),
            template_id: "d-1".to_string(),
            name: "first".to_string(),
            plain_content: None,
            ..Default::default()
        };

        let state = current.observe(version(true));
        assert_eq!(state.plain_content, None);

        let state = current.observe(version(false));
        assert_eq!(state.plain_content.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_import_takes_everything_reported() {
        let state = TemplateVersionState::default().observe(version(false));
        assert_eq!(state.plain_content.as_deref(), Some("Hi"));
        assert_eq!(state.template_id, "d-1");
        assert_eq!(state.active, Some(1));
    }
}
