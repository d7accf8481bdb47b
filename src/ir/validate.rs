//! Compiled artifact invariant validation.
//!
//! Checks that a compiled payload or UI plan is internally consistent before
//! it is submitted. A failure here is a compiler bug, not a user error.

use std::collections::{HashMap, HashSet};

use crate::parse::types::TimeUnit;

use super::rest::*;
use super::ui::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactError {
    pub code: &'static str,
    pub message: String,
    /// The action or temporary id where the error was found, if applicable.
    pub action_id: Option<String>,
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action_id {
            Some(id) => write!(f, "[{}] {} (at '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Validate a REST payload against all invariants. Returns all errors found.
pub fn validate_payload(payload: &FlowPayload) -> Vec<ArtifactError> {
    let mut errors = Vec::new();

    validate_actions_non_empty(payload, &mut errors);
    validate_single_trigger(payload, &mut errors);
    validate_unique_temporary_ids(payload, &mut errors);
    validate_links_and_entry(payload, &mut errors);
    validate_weekday_restriction(payload, &mut errors);

    errors
}

// ---------------------------------------------------------------------------
// Invariant: at least one action, exactly one trigger
// ---------------------------------------------------------------------------

fn validate_actions_non_empty(payload: &FlowPayload, errors: &mut Vec<ArtifactError>) {
    if payload.actions.is_empty() {
        errors.push(ArtifactError {
            code: "A001",
            message: "Payload must contain at least one action".into(),
            action_id: None,
        });
    }
}

fn validate_single_trigger(payload: &FlowPayload, errors: &mut Vec<ArtifactError>) {
    if payload.triggers.len() != 1 {
        errors.push(ArtifactError {
            code: "A002",
            message: format!(
                "Payload must carry exactly 1 trigger, found {}",
                payload.triggers.len()
            ),
            action_id: None,
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: temporary ids are unique and every reference resolves
// ---------------------------------------------------------------------------

fn validate_unique_temporary_ids(payload: &FlowPayload, errors: &mut Vec<ArtifactError>) {
    let mut seen = HashSet::new();
    for action in &payload.actions {
        if !seen.insert(action.temporary_id.as_str()) {
            errors.push(ArtifactError {
                code: "A003",
                message: format!("Duplicate temporary id '{}'", action.temporary_id),
                action_id: Some(action.temporary_id.clone()),
            });
        }
    }
}

fn validate_links_and_entry(payload: &FlowPayload, errors: &mut Vec<ArtifactError>) {
    let ids: HashSet<&str> = payload
        .actions
        .iter()
        .map(|a| a.temporary_id.as_str())
        .collect();

    if !ids.contains(payload.entry_action_id.as_str()) {
        errors.push(ArtifactError {
            code: "A004",
            message: format!(
                "entry_action_id '{}' does not match any temporary id",
                payload.entry_action_id
            ),
            action_id: None,
        });
    }

    for action in &payload.actions {
        for target in action.links.targets() {
            if !ids.contains(target) {
                errors.push(ArtifactError {
                    code: "A005",
                    message: format!(
                        "Action '{}' links to unknown temporary id '{}'",
                        action.temporary_id, target
                    ),
                    action_id: Some(action.temporary_id.clone()),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: weekday restriction only on day-granularity delays
// ---------------------------------------------------------------------------

fn validate_weekday_restriction(payload: &FlowPayload, errors: &mut Vec<ArtifactError>) {
    for action in &payload.actions {
        let ActionData::TimeDelay(delay) = &action.data else {
            continue;
        };
        let is_days = delay.unit == TimeUnit::Days;
        if is_days != delay.delay_until_weekdays.is_some() {
            errors.push(ArtifactError {
                code: "A006",
                message: format!(
                    "Delay in {} must {}carry a weekday restriction",
                    delay.unit.as_str(),
                    if is_days { "" } else { "not " }
                ),
                action_id: Some(action.temporary_id.clone()),
            });
        }
    }
}

/// Validate a UI plan: framed by create/save, each action placed once,
/// and nothing configured before it is placed.
pub fn validate_plan(plan: &UiPlan) -> Vec<ArtifactError> {
    let mut errors = Vec::new();

    if !matches!(
        plan.steps.first().map(|s| &s.operation),
        Some(UiOperation::CreateFlow { .. })
    ) {
        errors.push(ArtifactError {
            code: "U001",
            message: "Plan must start with create_flow".into(),
            action_id: None,
        });
    }
    if !matches!(
        plan.steps.last().map(|s| &s.operation),
        Some(UiOperation::SaveFlow)
    ) {
        errors.push(ArtifactError {
            code: "U002",
            message: "Plan must end with save_flow".into(),
            action_id: None,
        });
    }

    let mut placed: HashMap<&str, usize> = HashMap::new();
    let mut placement_order = Vec::new();
    for step in &plan.steps {
        if let UiOperation::PlaceAction { action_id, .. } = &step.operation {
            let count = placed.entry(action_id.as_str()).or_insert(0);
            if *count == 0 {
                placement_order.push(action_id.as_str());
            }
            *count += 1;
            continue;
        }
        if let Some(id) = step.action_id.as_deref() {
            if !placed.contains_key(id) {
                errors.push(ArtifactError {
                    code: "U003",
                    message: format!("Step '{}' configures an action before placing it", step.label),
                    action_id: Some(id.to_string()),
                });
            }
        }
    }

    for id in placement_order {
        let count = placed[id];
        if count > 1 {
            errors.push(ArtifactError {
                code: "U004",
                message: format!("Action placed {} times", count),
                action_id: Some(id.to_string()),
            });
        }
    }

    errors
}
