//! `sendgrid_template_version` data source.

use async_trait::async_trait;
use serde::Deserialize;

use super::{lookup_schema, DataSource};
use crate::error::ProviderError;
use crate::resources::template_version::{TemplateVersionResource, TemplateVersionState};
use crate::resources::{Resource, ResourceContext};
use crate::schema::Schema;

/// Lookup arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateVersionArgs {
    /// Owning template.
    pub template_id: String,
    /// Version id.
    pub id: String,
}

/// Looks up one version of a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVersionDataSource;

#[async_trait]
impl DataSource for TemplateVersionDataSource {
    type Args = TemplateVersionArgs;
    type State = TemplateVersionState;

    fn type_name(&self) -> &'static str {
        "sendgrid_template_version"
    }

    fn schema(&self) -> Schema {
        lookup_schema(
            Resource::schema(&TemplateVersionResource),
            &["template_id", "id"],
        )
        .with_description("An existing template version.")
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        args: TemplateVersionArgs,
    ) -> Result<TemplateVersionState, ProviderError> {
        let client = ctx.client();
        let (template_id, id) = (args.template_id.as_str(), args.id.as_str());
        let version = ctx
            .call("reading template version", || {
                client.get_template_version(template_id, id)
            })
            .await?;
        Ok(TemplateVersionState::default().observe(version))
    }
}
