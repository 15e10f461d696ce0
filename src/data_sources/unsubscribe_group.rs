//! `sendgrid_unsubscribe_group` data source.

use async_trait::async_trait;
use serde::Deserialize;

use super::{lookup_schema, DataSource};
use crate::error::ProviderError;
use crate::resources::unsubscribe_group::{UnsubscribeGroupResource, UnsubscribeGroupState};
use crate::resources::{numeric_id, Resource, ResourceContext};
use crate::schema::Schema;

/// Lookup arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnsubscribeGroupArgs {
    /// Group id.
    pub id: String,
}

/// Looks up an unsubscribe group by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsubscribeGroupDataSource;

#[async_trait]
impl DataSource for UnsubscribeGroupDataSource {
    type Args = UnsubscribeGroupArgs;
    type State = UnsubscribeGroupState;

    fn type_name(&self) -> &'static str {
        "sendgrid_unsubscribe_group"
    }

    fn schema(&self) -> Schema {
        lookup_schema(Resource::schema(&UnsubscribeGroupResource), &["id"])
            .with_description("An existing unsubscribe group.")
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        args: UnsubscribeGroupArgs,
    ) -> Result<UnsubscribeGroupState, ProviderError> {
        let id = numeric_id(&args.id, "unsubscribe group")?;
        let client = ctx.client();
        let group = ctx
            .call("reading unsubscribe group", || client.get_unsubscribe_group(id))
            .await?;
        Ok(group.into())
    }
}
