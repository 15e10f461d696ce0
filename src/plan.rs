//! Schema-driven planning.
//!
//! [`plan`] turns the host's proposed state into a planned state and a change
//! list using only what the [`Schema`] says about each attribute:
//!
//! - unset attributes with a default get the default;
//! - unset computed attributes keep their prior value, or stay unknown on create;
//! - a change to a `force_new` attribute requires replacement, and then
//!   computed values are unknown again;
//! - sets compare without regard to order.

use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Plan a resource change.
///
/// `prior` is `None` on create. A null `proposed` plans a destroy.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> Result<PlanResult, ProviderError> {
    let prior = prior.filter(|p| !p.is_null());

    if proposed.is_null() {
        return Ok(plan_destroy(prior));
    }

    let proposed = proposed.as_object().ok_or_else(|| {
        ProviderError::Validation("proposed state must be an object".to_string())
    })?;
    let empty = Map::new();
    let prior_obj = match prior {
        Some(p) => p
            .as_object()
            .ok_or_else(|| ProviderError::Validation("prior state must be an object".to_string()))?,
        None => &empty,
    };

    let mut planned = Map::new();
    for (name, attr) in &schema.attributes {
        let value = planned_value(attr, proposed.get(name), prior.and(prior_obj.get(name)));
        planned.insert(name.clone(), value);
    }

    let requires_replace = prior.is_some()
        && schema.attributes.iter().any(|(name, attr)| {
            attr.force_new && differs(attr, prior_obj.get(name), planned.get(name))
        });

    if requires_replace {
        // The replacement is a new remote object: nothing computed carries over.
        for (name, attr) in &schema.attributes {
            let configured = proposed.get(name).is_some_and(|v| !v.is_null());
            if attr.flags.computed && !configured {
                let fresh = attr.default.clone().unwrap_or(Value::Null);
                planned.insert(name.clone(), fresh);
            }
        }
    }

    let mut changes = Vec::new();
    for (name, attr) in &schema.attributes {
        let after = planned.get(name).filter(|v| !v.is_null());
        match prior {
            None => {
                if let Some(after) = after {
                    changes.push(AttributeChange::created(name.as_str(), after.clone()));
                } else if attr.flags.computed {
                    changes.push(AttributeChange::unknown(name.as_str()));
                }
            },
            Some(_) => {
                let before = prior_obj.get(name).filter(|v| !v.is_null());
                if requires_replace || differs(attr, before, after) {
                    if before.is_none() && after.is_none() {
                        continue;
                    }
                    changes.push(AttributeChange::new(
                        name.as_str(),
                        before.cloned(),
                        after.cloned(),
                    ));
                }
            },
        }
    }

    Ok(PlanResult::new(
        Value::Object(planned),
        changes,
        requires_replace,
    ))
}

fn plan_destroy(prior: Option<&Value>) -> PlanResult {
    let changes = prior
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(name, v)| AttributeChange::destroyed(name.as_str(), v.clone()))
                .collect()
        })
        .unwrap_or_default();
    PlanResult::destroy(changes)
}

fn planned_value(attr: &Attribute, proposed: Option<&Value>, prior: Option<&Value>) -> Value {
    match proposed.filter(|v| !v.is_null()) {
        Some(value) => normalize(&attr.attr_type, value),
        None => {
            if let Some(default) = &attr.default {
                default.clone()
            } else if attr.flags.computed {
                prior.cloned().unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        },
    }
}

fn differs(attr: &Attribute, before: Option<&Value>, after: Option<&Value>) -> bool {
    let before = before
        .filter(|v| !v.is_null())
        .map(|v| normalize(&attr.attr_type, v));
    let after = after
        .filter(|v| !v.is_null())
        .map(|v| normalize(&attr.attr_type, v));
    before != after
}

/// Sort set elements so that order never shows up as a diff.
fn normalize(attr_type: &AttributeType, value: &Value) -> Value {
    match (attr_type, value) {
        (AttributeType::Set(_), Value::Array(items)) => {
            let mut items = items.clone();
            items.sort_by_key(|item| item.to_string());
            items.dedup();
            Value::Array(items)
        },
        _ => value.clone(),
    }
}
