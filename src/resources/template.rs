//! `sendgrid_template`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_id, Resource, ResourceContext};
use crate::client::templates::{CreateTemplateRequest, Template, UpdateTemplateRequest};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Generation used when none is configured.
pub const DEFAULT_GENERATION: &str = "dynamic";

/// State of a `sendgrid_template`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateState {
    /// Template id.
    pub id: Option<String>,
    /// Template name.
    pub name: String,
    /// `legacy` or `dynamic`.
    pub generation: Option<String>,
    /// Last modification time.
    pub updated_at: Option<String>,
}

impl From<Template> for TemplateState {
    fn from(template: Template) -> Self {
        let generation = if template.generation.is_empty() {
            DEFAULT_GENERATION.to_string()
        } else {
            template.generation
        };
        Self {
            id: Some(template.id),
            name: template.name,
            generation: Some(generation),
            updated_at: template.updated_at,
        }
    }
}

/// Manages a transactional template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResource;

#[async_trait]
impl Resource for TemplateResource {
    type State = TemplateState;

    fn type_name(&self) -> &'static str {
        "sendgrid_template"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A transactional template.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Template name."),
            )
            .with_attribute(
                "generation",
                Attribute::optional_string()
                    .with_default(json!(DEFAULT_GENERATION))
                    .with_force_new()
                    .with_description("`legacy` or `dynamic`."),
            )
            .with_attribute("updated_at", Attribute::computed_string())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: TemplateState,
    ) -> Result<TemplateState, ProviderError> {
        let client = ctx.client();
        let request = CreateTemplateRequest {
            name: planned.name.clone(),
            generation: planned
                .generation
                .clone()
                .unwrap_or_else(|| DEFAULT_GENERATION.to_string()),
        };
        let template = ctx
            .call("creating template", || client.create_template(&request))
            .await?;
        Ok(template.into())
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: TemplateState,
    ) -> Result<Option<TemplateState>, ProviderError> {
        let id = require_id(&current.id, "template")?;
        let client = ctx.client();
        let template = ctx
            .call_optional("reading template", || client.get_template(id))
            .await?;
        Ok(template.map(Into::into))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: TemplateState,
        planned: TemplateState,
    ) -> Result<TemplateState, ProviderError> {
        let id = require_id(&prior.id, "template")?;
        let client = ctx.client();
        let request = UpdateTemplateRequest {
            name: planned.name.clone(),
        };
        let template = ctx
            .call("updating template", || client.update_template(id, &request))
            .await?;
        Ok(template.into())
    }

    async fn delete(&self, ctx: &ResourceContext, current: TemplateState) -> Result<(), ProviderError> {
        let id = require_id(&current.id, "template")?;
        let client = ctx.client();
        ctx.call("deleting template", || client.delete_template(id))
            .await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> Result<TemplateState, ProviderError> {
        let client = ctx.client();
        let template = ctx
            .call("importing template", || client.get_template(id))
            .await?;
        Ok(template.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_template() {
        let state = TemplateState::from(Template {
            id: "d-1".to_string(),
            name: "welcome".to_string(),
            generation: String::new(),
            updated_at: Some("2024-05-01 10:00:00".to_string()),
            versions: vec![],
        });

        assert_eq!(state.id.as_deref(), Some("d-1"));
        assert_eq!(state.generation.as_deref(), Some(DEFAULT_GENERATION));
        assert_eq!(state.updated_at.as_deref(), Some("2024-05-01 10:00:00"));
    }

    #[test]
    fn test_generation_forces_replacement() {
        let schema = Resource::schema(&TemplateResource);
        assert!(schema.attribute("generation").unwrap().force_new);
        assert!(!schema.attribute("name").unwrap().force_new);
    }
}
