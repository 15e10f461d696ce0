//! Plan, import and metadata values exchanged with the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::ProviderSchema;

/// The protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// First field of the handshake line.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";

/// One attribute of a plan. `None` on either side is absent or unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Value in prior state.
    pub before: Option<Value>,
    /// Value in planned state.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// A change from `before` to `after`.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// An attribute set by a create.
    pub fn created(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// A computed attribute only known after apply.
    pub fn unknown(path: impl Into<String>) -> Self {
        Self::new(path, None, None)
    }

    /// An attribute removed by a destroy.
    pub fn destroyed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        let payload = |value: Option<Value>| {
            value
                .and_then(|v| serde_json::to_vec(&v).ok())
                .unwrap_or_default()
        };
        Self {
            before: payload(change.before),
            after: payload(change.after),
            path: change.path,
        }
    }
}

/// Outcome of planning one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State the apply is expected to produce. Null for a destroy.
    pub planned_state: Value,
    /// Attributes that differ from prior state.
    pub changes: Vec<AttributeChange>,
    /// The remote object has to be deleted and created again.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A create or update plan.
    pub fn new(planned_state: Value, changes: Vec<AttributeChange>, requires_replace: bool) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// A destroy plan.
    pub fn destroy(changes: Vec<AttributeChange>) -> Self {
        Self::new(Value::Null, changes, false)
    }

    /// Whether applying this plan does anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Names of the changed attributes.
    pub fn changed_paths(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.path.as_str())
    }
}

/// State of an existing object brought under management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Resource type name.
    pub resource_type: String,
    /// State as read from SendGrid.
    pub state: Value,
}

impl ImportedResource {
    /// Pair a type name with imported state.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// What GetMetadata reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// The provider answers PlanResourceChange for destroys.
    pub plan_destroy: bool,
}

impl ProviderMetadata {
    /// Type names from `schema`. Destroy planning is off.
    pub fn from_schema(schema: &ProviderSchema) -> Self {
        Self {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            plan_destroy: false,
        }
    }

    /// Announce destroy planning.
    pub fn with_plan_destroy(mut self) -> Self {
        self.plan_destroy = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_change_to_proto() {
        let proto: crate::generated::AttributeChange =
            AttributeChange::new("name", Some(json!("old")), Some(json!("new"))).into();
        assert_eq!(proto.path, "name");
        assert_eq!(proto.before, br#""old""#.to_vec());
        assert_eq!(proto.after, br#""new""#.to_vec());

        let proto: crate::generated::AttributeChange = AttributeChange::unknown("id").into();
        assert!(proto.before.is_empty());
        assert!(proto.after.is_empty());
    }

    #[test]
    fn test_plan_result() {
        let plan = PlanResult::new(
            json!({"id": "123", "name": "new"}),
            vec![AttributeChange::new("name", Some(json!("old")), Some(json!("new")))],
            false,
        );
        assert!(plan.has_changes());
        assert_eq!(plan.changed_paths().collect::<Vec<_>>(), vec!["name"]);

        let destroy = PlanResult::destroy(vec![AttributeChange::destroyed("id", json!("123"))]);
        assert!(destroy.planned_state.is_null());
        assert!(!destroy.requires_replace);
        assert!(!PlanResult::destroy(vec![]).has_changes());
    }

    #[test]
    fn test_metadata_from_schema() {
        let schema = ProviderSchema::new()
            .with_resource("sendgrid_template", Schema::v0())
            .with_data_source("sendgrid_teammate", Schema::v0());

        let metadata = ProviderMetadata::from_schema(&schema);
        assert_eq!(metadata.resources, vec!["sendgrid_template"]);
        assert_eq!(metadata.data_sources, vec!["sendgrid_teammate"]);
        assert!(!metadata.plan_destroy);
        assert!(metadata.with_plan_destroy().plan_destroy);
    }
}
