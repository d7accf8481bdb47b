//! Map the flow trigger → REST trigger payload, resolving names to ids.

use crate::error::CompileError;
use crate::ir::rest::TriggerPayload;
use crate::parse::types::Trigger;
use crate::remote::{NameLookup, ResourceKind};

use super::condition::translate_filter;

pub async fn resolve_trigger(
    trigger: &Trigger,
    lookup: &dyn NameLookup,
) -> Result<TriggerPayload, CompileError> {
    match trigger {
        Trigger::Metric(t) => {
            let id = resolve_id(ResourceKind::Metric, t.id.as_deref(), t.name.as_deref(), lookup).await?;
            Ok(TriggerPayload {
                trigger_type: "metric".into(),
                id: Some(id),
                property: None,
                trigger_filter: t.filter.as_ref().map(translate_filter),
            })
        }
        Trigger::List(t) => {
            let id = resolve_id(ResourceKind::List, t.id.as_deref(), t.name.as_deref(), lookup).await?;
            Ok(TriggerPayload {
                trigger_type: "list".into(),
                id: Some(id),
                property: None,
                trigger_filter: None,
            })
        }
        Trigger::Date(t) => {
            let property = t
                .property
                .clone()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| CompileError::Incomplete("date trigger has no property".into()))?;
            Ok(TriggerPayload {
                trigger_type: "date".into(),
                id: None,
                property: Some(property),
                trigger_filter: None,
            })
        }
    }
}

async fn resolve_id(
    kind: ResourceKind,
    id: Option<&str>,
    name: Option<&str>,
    lookup: &dyn NameLookup,
) -> Result<String, CompileError> {
    if let Some(id) = id.filter(|i| !i.trim().is_empty()) {
        return Ok(id.to_string());
    }
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return Err(CompileError::Incomplete(format!(
            "{} trigger has neither a name nor an id",
            kind.as_str()
        )));
    };

    match lookup.lookup(kind, name).await {
        Ok(Some(id)) => {
            tracing::debug!(kind = kind.as_str(), name, id = %id, "trigger resolved");
            Ok(id)
        }
        Ok(None) => Err(CompileError::Unresolved {
            kind: kind.as_str(),
            name: name.to_string(),
            reason: "no exact or partial name match in the directory".into(),
        }),
        Err(e) => Err(CompileError::Unresolved {
            kind: kind.as_str(),
            name: name.to_string(),
            reason: e.to_string(),
        }),
    }
}
