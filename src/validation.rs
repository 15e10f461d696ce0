//! Checking configuration against a [`Schema`].
//!
//! Resource configuration, data source arguments and provider configuration
//! all go through [`validate`]. Problems come back as error diagnostics whose
//! `attribute` is a dotted path such as `subuser_access.0.id`.
//!
//! # Example
//!
//! ```
//! use sendgrid_provider::schema::{Attribute, Schema};
//! use sendgrid_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("active", Attribute::optional_int64());
//!
//! assert!(validate(&schema, &json!({"name": "welcome", "active": 1})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "welcome", "active": "yes"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("active"));
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};

/// Check `value` against `schema`.
///
/// Null means an empty configuration. Required attributes must be non-null,
/// computed-only attributes are not checked, and attributes the schema does
/// not declare are rejected. An empty result means `value` is acceptable.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let config = match value {
        Value::Null => return diagnostics,
        Value::Object(config) => config,
        other => {
            diagnostics.push(
                Diagnostic::error("Configuration must be an object")
                    .with_detail(format!("Got {}", kind(other))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.attributes {
        check_attribute(attr, config.get(name), name, &mut diagnostics);
    }

    diagnostics.extend(
        config
            .keys()
            .filter(|name| schema.attribute(name).is_none())
            .map(|name| {
                Diagnostic::error(format!("Unknown attribute '{}'", name))
                    .with_detail("This attribute is not supported here")
                    .with_attribute(name.as_str())
            }),
    );

    diagnostics
}

fn check_attribute(attr: &Attribute, value: Option<&Value>, path: &str, out: &mut Vec<Diagnostic>) {
    if attr.flags.is_computed_only() {
        return;
    }
    match value.filter(|v| !v.is_null()) {
        Some(value) => check_type(&attr.attr_type, value, path, out),
        None if attr.flags.required => out.push(
            Diagnostic::error(format!("Attribute '{}' is required", path))
                .with_detail("Set it in the configuration")
                .with_attribute(path),
        ),
        None => {},
    }
}

fn check_type(attr_type: &AttributeType, value: &Value, path: &str, out: &mut Vec<Diagnostic>) {
    let ok = match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::List(element) | AttributeType::Set(element) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_type(element, item, &format!("{}.{}", path, i), out);
                }
                true
            },
            _ => false,
        },
        AttributeType::Map(element) => match value {
            Value::Object(entries) => {
                for (key, item) in entries {
                    check_type(element, item, &format!("{}.{}", path, key), out);
                }
                true
            },
            _ => false,
        },
        AttributeType::Object(fields) => match value {
            Value::Object(entries) => {
                check_fields(fields, entries, path, out);
                true
            },
            _ => false,
        },
    };

    if !ok {
        out.push(
            Diagnostic::error(format!("Attribute '{}' has the wrong type", path))
                .with_detail(format!("Expected {}, got {}", type_name(attr_type), kind(value)))
                .with_attribute(path),
        );
    }
}

/// Object fields have no flags of their own: absent or null is fine.
fn check_fields(
    fields: &BTreeMap<String, AttributeType>,
    entries: &Map<String, Value>,
    path: &str,
    out: &mut Vec<Diagnostic>,
) {
    for (name, field_type) in fields {
        if let Some(value) = entries.get(name).filter(|v| !v.is_null()) {
            check_type(field_type, value, &format!("{}.{}", path, name), out);
        }
    }
}

fn type_name(attr_type: &AttributeType) -> &'static str {
    match attr_type {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
        AttributeType::Object(_) => "object",
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Integral numbers, including floats like `2.0` that some hosts send.
fn is_int64(value: &Value) -> bool {
    let Value::Number(n) = value else {
        return false;
    };
    n.as_i64().is_some()
        || n.as_f64()
            .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeFlags;
    use serde_json::json;

    fn single(schema: &Schema, value: Value) -> Diagnostic {
        let mut diagnostics = validate(schema, &value);
        assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
        diagnostics.remove(0)
    }

    #[test]
    fn test_required_attribute() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "welcome"})).is_empty());
        assert_eq!(single(&schema, json!({})).attribute.as_deref(), Some("name"));
        assert!(single(&schema, json!({"name": null})).summary.contains("is required"));
    }

    #[test]
    fn test_optional_attribute() {
        let schema = Schema::v0().with_attribute("subdomain", Attribute::optional_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"subdomain": null})).is_empty());
        assert!(validate(&schema, &json!({"subdomain": "em"})).is_empty());
        assert_eq!(
            single(&schema, json!({"subdomain": 7})).detail.as_deref(),
            Some("Expected string, got number")
        );
    }

    #[test]
    fn test_computed_only_is_not_checked() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());
        assert!(validate(&schema, &json!({"id": 12})).is_empty());
    }

    #[test]
    fn test_int64() {
        let schema = Schema::v0().with_attribute("active", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"active": 1})).is_empty());
        assert!(validate(&schema, &json!({"active": 1.0})).is_empty());
        assert_eq!(
            single(&schema, json!({"active": 1.5})).detail.as_deref(),
            Some("Expected int64, got number")
        );
    }

    #[test]
    fn test_bool() {
        let schema = Schema::v0().with_attribute("disabled", Attribute::optional_bool());

        assert!(validate(&schema, &json!({"disabled": true})).is_empty());
        single(&schema, json!({"disabled": "true"}));
    }

    #[test]
    fn test_set_elements() {
        let schema = Schema::v0().with_attribute("scopes", Attribute::optional_string_set());

        assert!(validate(&schema, &json!({"scopes": ["mail.send"]})).is_empty());
        assert_eq!(
            single(&schema, json!({"scopes": ["mail.send", 3]})).attribute.as_deref(),
            Some("scopes.1")
        );
        assert_eq!(
            single(&schema, json!({"scopes": "mail.send"})).detail.as_deref(),
            Some("Expected set, got string")
        );
    }

    #[test]
    fn test_list_of_objects() {
        let access = AttributeType::list(AttributeType::object([
            ("id", AttributeType::Int64),
            ("permission_type", AttributeType::String),
            ("scopes", AttributeType::set(AttributeType::String)),
        ]));
        let schema = Schema::v0().with_attribute(
            "subuser_access",
            Attribute::new(access, AttributeFlags::optional()),
        );

        let ok = json!({"subuser_access": [{"id": 1, "permission_type": "admin", "scopes": []}]});
        assert!(validate(&schema, &ok).is_empty());

        let bad = json!({"subuser_access": [{"id": "one", "permission_type": "admin"}]});
        assert_eq!(single(&schema, bad).attribute.as_deref(), Some("subuser_access.0.id"));
    }

    #[test]
    fn test_map_values() {
        let schema = Schema::v0().with_attribute(
            "labels",
            Attribute::new(AttributeType::map(AttributeType::String), AttributeFlags::optional()),
        );

        assert!(validate(&schema, &json!({"labels": {"team": "mail"}})).is_empty());
        assert_eq!(
            single(&schema, json!({"labels": {"team": 1}})).attribute.as_deref(),
            Some("labels.team")
        );
    }

    #[test]
    fn test_unknown_attribute() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostic = single(&schema, json!({"name": "a", "nmae": "b"}));
        assert_eq!(diagnostic.attribute.as_deref(), Some("nmae"));
        assert!(diagnostic.summary.contains("Unknown attribute"));
    }

    #[test]
    fn test_every_problem_is_reported() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("url", Attribute::required_string())
            .with_attribute("enabled", Attribute::optional_bool());

        assert_eq!(validate(&schema, &json!({"enabled": "yes"})).len(), 3);
    }

    #[test]
    fn test_root_must_be_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert_eq!(
            single(&schema, json!("just a string")).summary,
            "Configuration must be an object"
        );
        assert!(validate(&schema, &Value::Null).is_empty());
    }
}
