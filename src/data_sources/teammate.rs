//! `sendgrid_teammate` data source.

use async_trait::async_trait;
use serde::Deserialize;

use super::{lookup_schema, DataSource};
use crate::error::ProviderError;
use crate::resources::teammate::{TeammateResource, TeammateState};
use crate::resources::{Resource, ResourceContext};
use crate::schema::Schema;

/// Lookup arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeammateArgs {
    /// Teammate address.
    pub email: String,
}

/// Looks up a teammate or pending invitation by email.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeammateDataSource;

#[async_trait]
impl DataSource for TeammateDataSource {
    type Args = TeammateArgs;
    type State = TeammateState;

    fn type_name(&self) -> &'static str {
        "sendgrid_teammate"
    }

    fn schema(&self) -> Schema {
        lookup_schema(Resource::schema(&TeammateResource), &["email"])
            .with_description("An existing teammate or open invitation.")
    }

    async fn read(&self, ctx: &ResourceContext, args: TeammateArgs) -> Result<TeammateState, ProviderError> {
        TeammateResource::find(ctx, &args.email)
            .await?
            .map(|observed| TeammateState::default().observe(observed))
            .ok_or_else(|| ProviderError::NotFound(format!("teammate {}", args.email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_email_is_configurable() {
        let schema = DataSource::schema(&TeammateDataSource);

        assert!(schema.attribute("email").unwrap().flags.required);
        for (name, attr) in &schema.attributes {
            if name != "email" {
                assert!(attr.flags.is_computed_only(), "{} should be computed", name);
            }
        }
        assert!(schema.attribute("token").unwrap().flags.sensitive);
    }
}
