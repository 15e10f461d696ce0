//! Read-only views of SendGrid objects.
//!
//! Unlike resources, a data source that cannot find its object fails with a
//! `NotFound` error instead of returning empty state.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::resources::{decode_state, encode_state, ResourceContext};
use crate::schema::{AttributeFlags, Schema};

pub mod api_key;
pub mod teammate;
pub mod template;
pub mod template_version;
pub mod unsubscribe_group;

/// A data source with typed arguments and result.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Lookup arguments taken from configuration.
    type Args: DeserializeOwned + Send + 'static;
    /// What the lookup produces.
    type State: Serialize + Send + 'static;

    /// Type name, e.g. `sendgrid_template`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema. Lookup keys are required, the rest computed.
    fn schema(&self) -> Schema;

    /// Fetch the object.
    async fn read(&self, ctx: &ResourceContext, args: Self::Args) -> Result<Self::State, ProviderError>;
}

/// A [`DataSource`] with JSON arguments and result.
#[async_trait]
pub trait AnyDataSource: Send + Sync {
    /// Type name.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// See [`DataSource::read`].
    async fn read(&self, ctx: &ResourceContext, config: Value) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<D: DataSource> AnyDataSource for D {
    fn type_name(&self) -> &'static str {
        DataSource::type_name(self)
    }

    fn schema(&self) -> Schema {
        DataSource::schema(self)
    }

    async fn read(&self, ctx: &ResourceContext, config: Value) -> Result<Value, ProviderError> {
        let state = DataSource::read(self, ctx, decode_state(config)?).await?;
        encode_state(&state)
    }
}

/// Derive a data source schema from a resource schema.
///
/// `keys` become required lookup arguments; every other attribute is
/// reported only.
pub(crate) fn lookup_schema(resource: Schema, keys: &[&str]) -> Schema {
    let mut schema = resource;
    for (name, attr) in schema.attributes.iter_mut() {
        attr.force_new = false;
        attr.default = None;
        let base = if keys.contains(&name.as_str()) {
            AttributeFlags::required()
        } else {
            AttributeFlags::computed()
        };
        attr.flags = AttributeFlags {
            sensitive: attr.flags.sensitive,
            ..base
        };
    }
    schema
}

/// All data source types, keyed by type name.
pub fn registry() -> BTreeMap<&'static str, Box<dyn AnyDataSource>> {
    let data_sources: Vec<Box<dyn AnyDataSource>> = vec![
        Box::new(api_key::ApiKeyDataSource),
        Box::new(teammate::TeammateDataSource),
        Box::new(template::TemplateDataSource),
        Box::new(template_version::TemplateVersionDataSource),
        Box::new(unsubscribe_group::UnsubscribeGroupDataSource),
    ];
    data_sources
        .into_iter()
        .map(|d| (d.type_name(), d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    #[test]
    fn test_lookup_schema() {
        let resource = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute(
                "secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_default(serde_json::json!("x")),
            );

        let schema = lookup_schema(resource, &["id"]);

        assert!(schema.attribute("id").unwrap().flags.required);
        let name = schema.attribute("name").unwrap();
        assert!(name.flags.is_computed_only());
        assert!(!name.force_new);
        let secret = schema.attribute("secret").unwrap();
        assert!(secret.flags.sensitive);
        assert_eq!(secret.default, None);
    }

    #[test]
    fn test_registry() {
        let registry = registry();
        assert_eq!(
            registry.keys().copied().collect::<Vec<_>>(),
            vec![
                "sendgrid_api_key",
                "sendgrid_teammate",
                "sendgrid_template",
                "sendgrid_template_version",
                "sendgrid_unsubscribe_group",
            ]
        );
        for data_source in registry.values() {
            let schema = data_source.schema();
            assert!(schema.attributes.values().any(|a| a.flags.required));
        }
    }
}
