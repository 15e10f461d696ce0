//! `sendgrid_api_key` data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DataSource;
use crate::error::ProviderError;
use crate::reconcile::reconcile_scopes;
use crate::resources::ResourceContext;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// Lookup arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeyArgs {
    /// Key id.
    pub id: String,
}

/// An API key without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyData {
    /// Key id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Granted scopes, without the automatic ones.
    pub scopes: Vec<String>,
}

/// Looks up an API key by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyDataSource;

#[async_trait]
impl DataSource for ApiKeyDataSource {
    type Args = ApiKeyArgs;
    type State = ApiKeyData;

    fn type_name(&self) -> &'static str {
        "sendgrid_api_key"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("An existing API key. The secret is never available.")
            .with_attribute("id", Attribute::required_string())
            .with_attribute("name", Attribute::computed_string())
            .with_attribute(
                "scopes",
                Attribute::new(AttributeType::set(AttributeType::String), AttributeFlags::computed()),
            )
    }

    async fn read(&self, ctx: &ResourceContext, args: ApiKeyArgs) -> Result<ApiKeyData, ProviderError> {
        let client = ctx.client();
        let id = args.id.as_str();
        let key = ctx
            .call("reading API key", || client.get_api_key(id))
            .await?;
        Ok(ApiKeyData {
            id: key.api_key_id,
            name: key.name,
            scopes: reconcile_scopes(&[], &key.scopes),
        })
    }
}
