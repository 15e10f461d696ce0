//! `sendgrid_template` data source.

use async_trait::async_trait;
use serde::Deserialize;

use super::{lookup_schema, DataSource};
use crate::error::ProviderError;
use crate::resources::template::{TemplateResource, TemplateState};
use crate::resources::{Resource, ResourceContext};
use crate::schema::Schema;

/// Lookup arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateArgs {
    /// Template id.
    pub id: String,
}

/// Looks up a transactional template by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDataSource;

#[async_trait]
impl DataSource for TemplateDataSource {
    type Args = TemplateArgs;
    type State = TemplateState;

    fn type_name(&self) -> &'static str {
        "sendgrid_template"
    }

    fn schema(&self) -> Schema {
        lookup_schema(Resource::schema(&TemplateResource), &["id"])
            .with_description("An existing transactional template.")
    }

    async fn read(&self, ctx: &ResourceContext, args: TemplateArgs) -> Result<TemplateState, ProviderError> {
        let client = ctx.client();
        let id = args.id.as_str();
        let template = ctx
            .call("reading template", || client.get_template(id))
            .await?;
        Ok(template.into())
    }
}
