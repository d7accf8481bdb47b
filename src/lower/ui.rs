//! Flow → simulated-UI plan.
//!
//! Actions are placed in traversal order, so every action's tree parent is
//! already on the canvas when it is dropped. Links that are not tree edges
//! (re-convergence, cycles) are wired with `ConnectLink` once everything has
//! been placed.

use std::collections::{HashMap, HashSet};

use crate::error::CompileError;
use crate::ir::CompileWarning;
use crate::ir::ui::*;
use crate::parse::types::*;
use crate::remote::ContentRefs;
use crate::settings::effective_settings;

use super::traverse::{Visit, walk};

pub fn compile_for_ui(flow: &Flow) -> Result<UiPlan, CompileError> {
    compile_for_ui_with(flow, &ContentRefs::new())
}

/// Compile with content references produced by an earlier content step.
pub fn compile_for_ui_with(flow: &Flow, content: &ContentRefs) -> Result<UiPlan, CompileError> {
    let trigger = flow
        .trigger
        .as_ref()
        .ok_or_else(|| CompileError::Incomplete("flow has no trigger".into()))?;
    if flow.entry_action_id.is_none() {
        return Err(CompileError::Incomplete("flow has no entry_action_id".into()));
    }

    let mut plan = PlanBuilder::new(&flow.name);
    plan.push(
        UiOperation::CreateFlow {
            name: flow.name.clone(),
        },
        None,
        true,
    );
    plan.push(
        UiOperation::SelectTrigger {
            trigger_type: trigger.trigger_type().to_string(),
            name: trigger_subject(trigger),
        },
        None,
        true,
    );

    if let Some(filter) = trigger.filter().filter(|f| has_groups(f)) {
        plan.push(
            UiOperation::ApplyTriggerFilter {
                filter: filter.clone(),
            },
            None,
            false,
        );
    }
    if let Some(filter) = flow.profile_filter.as_ref().filter(|f| has_groups(f)) {
        plan.push(
            UiOperation::ApplyProfileFilter {
                filter: filter.clone(),
            },
            None,
            false,
        );
    }
    if let Some(policy) = flow
        .settings
        .as_ref()
        .and_then(|s| s.reentry.as_ref())
        .and_then(|r| r.policy().ok())
    {
        plan.push(UiOperation::SetReentry { policy }, None, false);
    }

    let visits = walk(flow);
    for visit in &visits {
        place(&mut plan, flow, visit, content);
    }
    connect_remaining(&mut plan, &visits);

    plan.push(UiOperation::SaveFlow, None, true);

    tracing::debug!(flow = %flow.name, steps = plan.steps.len(), "compiled UI plan");
    Ok(plan.finish())
}

struct PlanBuilder {
    flow_name: String,
    steps: Vec<UiStep>,
    warnings: Vec<CompileWarning>,
}

impl PlanBuilder {
    fn new(flow_name: &str) -> Self {
        PlanBuilder {
            flow_name: flow_name.to_string(),
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn push(&mut self, operation: UiOperation, action_id: Option<&str>, critical: bool) {
        let index = self.steps.len() + 1;
        let subject = match &operation {
            UiOperation::CreateFlow { name } | UiOperation::SelectTrigger { name, .. } => {
                Some(name.clone())
            }
            UiOperation::ConnectLink { from, to, .. } => Some(format!("{from}->{to}")),
            _ => action_id.map(str::to_string),
        };
        let label = match subject {
            Some(s) => format!("{index}: {} {s}", operation.name()),
            None => format!("{index}: {}", operation.name()),
        };
        self.steps.push(UiStep {
            index,
            label,
            action_id: action_id.map(str::to_string),
            critical,
            operation,
        });
    }

    fn warn(&mut self, action_id: &str, message: impl Into<String>) {
        self.warnings.push(CompileWarning::new(Some(action_id), message));
    }

    fn finish(self) -> UiPlan {
        UiPlan {
            flow_name: self.flow_name,
            steps: self.steps,
            warnings: self.warnings,
        }
    }
}

fn trigger_subject(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Date(t) => t.property.clone().unwrap_or_default(),
        _ => trigger.display_name().unwrap_or_default().to_string(),
    }
}

fn has_groups(filter: &ConditionFilter) -> bool {
    filter
        .condition_groups
        .as_ref()
        .is_some_and(|groups| groups.iter().any(|g| !g.conditions.is_empty()))
}

fn component(action: &Action) -> UiComponent {
    match action {
        Action::TimeDelay(_) => UiComponent::TimeDelay,
        Action::SendMessage(a) => match a.config.channel {
            Channel::Email => UiComponent::Email,
            Channel::Sms => UiComponent::Sms,
        },
        Action::ConditionalSplit(_) => UiComponent::ConditionalSplit,
        Action::AbSplit(_) => UiComponent::AbSplit,
    }
}

fn place(plan: &mut PlanBuilder, flow: &Flow, visit: &Visit<'_>, content: &ContentRefs) {
    let action = visit.action;
    let id = action.id();

    let placement = match (visit.via, visit.reachable) {
        (Some((from, link)), _) => Placement::After {
            action_id: from.to_string(),
            link,
        },
        (None, true) => Placement::AfterTrigger,
        (None, false) => {
            plan.warn(id, "action is not reachable from the entry; placed detached");
            Placement::Detached
        }
    };

    plan.push(
        UiOperation::PlaceAction {
            action_id: id.to_string(),
            component: component(action),
            placement,
        },
        Some(id),
        true,
    );

    match action {
        Action::TimeDelay(a) => plan.push(
            UiOperation::ConfigureTimeDelay {
                action_id: id.to_string(),
                amount: a.config.amount,
                unit: a.config.unit,
            },
            Some(id),
            false,
        ),
        Action::SendMessage(a) => {
            plan.push(
                UiOperation::FillMessageName {
                    action_id: id.to_string(),
                    name: action.label().to_string(),
                },
                Some(id),
                false,
            );
            let settings = effective_settings(action, flow);
            let content_ref = content.get(id).map(|c| c.id.clone());
            if a.config.content.is_some() && content_ref.is_none() {
                plan.warn(id, "message has rich content but no content reference; body left empty");
            }
            plan.push(
                UiOperation::ConfigureMessage {
                    action_id: id.to_string(),
                    channel: a.config.channel,
                    subject: a.config.subject.clone(),
                    preview_text: a.config.preview_text.clone(),
                    body: a.config.body.clone(),
                    content_ref,
                    smart_sending: settings.smart_sending,
                    utm_tracking: settings.utm_tracking,
                },
                Some(id),
                false,
            );
        }
        Action::ConditionalSplit(a) => {
            if a.config.condition.classify() == ConditionKind::Unknown {
                tracing::warn!(action = id, kind = %a.config.condition.kind, "unknown condition kind");
                plan.warn(
                    id,
                    format!(
                        "unknown condition kind '{}'; the split is left unconfigured",
                        a.config.condition.kind
                    ),
                );
            } else {
                plan.push(
                    UiOperation::ConfigureCondition {
                        action_id: id.to_string(),
                        condition: a.config.condition.clone(),
                    },
                    Some(id),
                    false,
                );
            }
        }
        Action::AbSplit(a) => plan.push(
            UiOperation::ConfigureAbSplit {
                action_id: id.to_string(),
                variant_a: a.config.variant_a.clone(),
                variant_b: a.config.variant_b.clone(),
                split_ratio: a.config.split_ratio,
            },
            Some(id),
            false,
        ),
    }
}

/// Every link that did not place its target becomes an explicit connection.
fn connect_remaining(plan: &mut PlanBuilder, visits: &[Visit<'_>]) {
    let tree_edges: HashMap<&str, (&str, LinkKind)> = visits
        .iter()
        .filter_map(|v| v.via.map(|via| (v.action.id(), via)))
        .collect();
    let placed: HashSet<&str> = visits.iter().map(|v| v.action.id()).collect();

    for visit in visits {
        let from = visit.action.id();
        for (link, to) in visit.action.links() {
            if !placed.contains(to) {
                continue;
            }
            if tree_edges.get(to) == Some(&(from, link)) {
                continue;
            }
            plan.push(
                UiOperation::ConnectLink {
                    from: from.to_string(),
                    link,
                    to: to.to_string(),
                },
                Some(from),
                true,
            );
        }
    }
}
