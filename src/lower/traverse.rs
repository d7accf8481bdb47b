//! Deterministic, cycle-safe visitation order over a flow's actions.
//!
//! Depth-first from the entry action, links followed in declaration order
//! (`next`, true before false, variant A before variant B). An action reached
//! again by any path is skipped. Actions never reached are appended in
//! definition order, so the result always covers every action exactly once.

use std::collections::HashMap;

use serde::Serialize;

use crate::parse::graph::FlowGraph;
use crate::parse::types::{Action, Flow, LinkKind};

/// One entry of the walk: the action and the tree link it was first reached
/// through. `via` is `None` for the entry and for unreachable actions.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub action: &'a Action,
    pub position: usize,
    pub via: Option<(&'a str, LinkKind)>,
    pub reachable: bool,
}

/// Ordered list of actions, each exactly once.
pub fn traverse(flow: &Flow) -> Vec<&Action> {
    walk(flow).into_iter().map(|v| v.action).collect()
}

/// Like [`traverse`], keeping the tree link each action was reached by.
pub fn walk(flow: &Flow) -> Vec<Visit<'_>> {
    let graph = FlowGraph::build(flow);
    let mut visited = vec![false; flow.actions.len()];
    let mut order = Vec::with_capacity(flow.actions.len());

    if let Some(entry) = flow.entry_action_id.as_deref().and_then(|id| graph.position(id)) {
        let mut stack: Vec<(usize, Option<(&str, LinkKind)>)> = vec![(entry, None)];
        while let Some((pos, via)) = stack.pop() {
            if visited[pos] {
                continue;
            }
            visited[pos] = true;
            let action = &flow.actions[pos];
            order.push(Visit {
                action,
                position: pos,
                via,
                reachable: true,
            });

            // Reverse push so the first declared link is walked first.
            for (kind, target) in graph.successors(action.id()).into_iter().rev() {
                if let Some(next) = graph.position(target.id()) {
                    if !visited[next] {
                        stack.push((next, Some((action.id(), kind))));
                    }
                }
            }
        }
    }

    for (pos, action) in flow.actions.iter().enumerate() {
        if !visited[pos] {
            order.push(Visit {
                action,
                position: pos,
                via: None,
                reachable: false,
            });
        }
    }

    order
}

// ---------------------------------------------------------------------------
// Correlation with remote-created resources
// ---------------------------------------------------------------------------

/// A resource the remote system created, as echoed back by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct RemoteResource {
    pub id: String,
    /// Remote type key, compared against [`remote_type_key`].
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correlation {
    pub action_id: String,
    pub remote_id: String,
    pub resource_type: String,
}

/// Remote type key of an action, matching what the REST compiler emits.
pub fn remote_type_key(action: &Action) -> &'static str {
    match action {
        Action::TimeDelay(_) => "time-delay",
        Action::SendMessage(a) => match a.config.channel {
            crate::parse::types::Channel::Email => "send-email",
            crate::parse::types::Channel::Sms => "send-sms",
        },
        Action::ConditionalSplit(_) => "conditional-split",
        Action::AbSplit(_) => "ab-test",
    }
}

/// Pair the Nth local action of each remote type (in traversal order) with the
/// Nth remote resource of that type.
///
/// This is a heuristic. The remote system does not echo client-supplied ids
/// for created actions, so a remote that reorders or batches creation will be
/// silently mis-attributed. Surplus on either side is left unpaired.
pub fn correlate(order: &[&Action], remote: &[RemoteResource]) -> Vec<Correlation> {
    let mut by_type: HashMap<&str, Vec<&RemoteResource>> = HashMap::new();
    for resource in remote {
        by_type
            .entry(resource.resource_type.as_str())
            .or_default()
            .push(resource);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut correlations = Vec::new();
    for action in order {
        let key = remote_type_key(action);
        let nth = seen.entry(key).or_insert(0);
        if let Some(resource) = by_type.get(key).and_then(|r| r.get(*nth)) {
            correlations.push(Correlation {
                action_id: action.id().to_string(),
                remote_id: resource.id.clone(),
                resource_type: key.to_string(),
            });
        }
        *nth += 1;
    }
    correlations
}
