//! Condition translation into the remote filter schema.
//!
//! Filters (profile and trigger filters) pass through structurally. Split
//! conditions are translated per kind; message-engagement kinds have no
//! faithful remote equivalent and compile to a placeholder plus a warning, so
//! one split never sinks the whole build.

use serde_json::{Value, json};

use crate::ir::CompileWarning;
use crate::ir::rest::{FilterGroupPayload, FilterPayload};
use crate::parse::types::{Condition, ConditionDescriptor, ConditionFilter, ConditionKind};

pub fn translate_filter(filter: &ConditionFilter) -> FilterPayload {
    let groups = filter.condition_groups.as_deref().unwrap_or_default();
    FilterPayload {
        condition_groups: groups
            .iter()
            .map(|g| FilterGroupPayload {
                conditions: g.conditions.iter().map(translate_condition).collect(),
            })
            .collect(),
    }
}

fn translate_condition(condition: &Condition) -> Value {
    let mut object = condition.params.clone();
    object.insert("type".into(), Value::String(condition.condition_type.clone()));
    Value::Object(object)
}

/// Structurally valid condition that matches everyone subscribed to email.
/// Stands in for conditions the remote schema cannot express.
pub fn placeholder_filter() -> Value {
    json!({
        "condition_groups": [{
            "conditions": [{
                "type": "profile-marketing-consent",
                "consent": {
                    "channel": "email",
                    "can_receive_marketing": true,
                    "consent_status": { "subscription": "any" }
                }
            }]
        }]
    })
}

/// Translate a split condition into a remote profile filter.
pub fn translate_split(
    action_id: &str,
    condition: &ConditionDescriptor,
    warnings: &mut Vec<CompileWarning>,
) -> Value {
    match condition.classify() {
        ConditionKind::HasOpenedMessage
        | ConditionKind::HasClickedMessage
        | ConditionKind::HasReceivedMessage => {
            warnings.push(CompileWarning::new(
                Some(action_id),
                format!(
                    "condition '{}' has no equivalent in the remote filter schema; \
                     a placeholder was used and must be corrected manually after creation",
                    condition.kind
                ),
            ));
            placeholder_filter()
        }
        ConditionKind::ProfileProperty => match profile_property(condition) {
            Some(filter) => filter,
            None => {
                warnings.push(CompileWarning::new(
                    Some(action_id),
                    "profile_property condition has no 'property'; a placeholder was used",
                ));
                placeholder_filter()
            }
        },
        ConditionKind::Custom => match condition.params.get("filter") {
            Some(raw @ Value::Object(_)) => raw.clone(),
            _ => {
                warnings.push(CompileWarning::new(
                    Some(action_id),
                    "custom condition has no 'filter' object; a placeholder was used",
                ));
                placeholder_filter()
            }
        },
        ConditionKind::Unknown => {
            tracing::warn!(
                action = action_id,
                kind = %condition.kind,
                "unknown condition kind, compiling placeholder"
            );
            warnings.push(CompileWarning::new(
                Some(action_id),
                format!(
                    "unknown condition kind '{}'; a placeholder was used and must be corrected manually",
                    condition.kind
                ),
            ));
            placeholder_filter()
        }
    }
}

fn profile_property(condition: &ConditionDescriptor) -> Option<Value> {
    let property = condition.param_str("property")?;
    let operator = condition.param_str("operator").unwrap_or("equals");
    let value = condition.params.get("value").cloned().unwrap_or(Value::Null);
    let value_type = match &value {
        Value::Number(_) => "numeric",
        Value::Bool(_) => "boolean",
        _ => "string",
    };

    Some(json!({
        "condition_groups": [{
            "conditions": [{
                "type": "profile-property",
                "property": property,
                "filter": {
                    "type": value_type,
                    "operator": operator,
                    "value": value
                }
            }]
        }]
    }))
}
