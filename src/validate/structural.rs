//! Graph-level structural rules: required fields, entry, ids, links,
//! reachability.

use std::collections::HashMap;

use crate::parse::graph::FlowGraph;
use crate::parse::types::Flow;

use super::Finding;

pub fn v001_required_fields(flow: &Flow, findings: &mut Vec<Finding>) {
    if flow.name.trim().is_empty() {
        findings.push(Finding::error("V001", "Flow must have a name", None));
    }
    if flow.trigger.is_none() {
        findings.push(Finding::error("V002", "Flow must have a trigger", None));
    }
    if flow.actions.is_empty() {
        findings.push(Finding::error(
            "V003",
            "Flow must have at least one action",
            None,
        ));
    }
    for (position, action) in flow.actions.iter().enumerate() {
        if action.id().trim().is_empty() {
            findings.push(Finding::error(
                "V005",
                format!("Action at position {} has no id", position),
                None,
            ));
        }
    }
    if flow
        .entry_action_id
        .as_deref()
        .is_none_or(|id| id.trim().is_empty())
    {
        findings.push(Finding::error(
            "V004",
            "Flow must declare entry_action_id",
            None,
        ));
    }
}

pub fn v020_entry_resolves(flow: &Flow, graph: &FlowGraph<'_>, findings: &mut Vec<Finding>) {
    // Missing entry is already reported by V004.
    let Some(entry) = flow.entry_action_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        return;
    };
    if graph.action(entry).is_none() {
        findings.push(Finding::error(
            "V020",
            format!("entry_action_id '{}' does not match any action", entry),
            None,
        ));
    }
}

pub fn v030_unique_ids(flow: &Flow, findings: &mut Vec<Finding>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    // Blank ids are reported by V005.
    for action in flow.actions.iter().filter(|a| !a.id().trim().is_empty()) {
        let count = counts.entry(action.id()).or_insert(0);
        if *count == 0 {
            order.push(action.id());
        }
        *count += 1;
    }

    for id in order {
        let count = counts[id];
        if count > 1 {
            findings.push(Finding::error(
                "V030",
                format!("Action id '{}' is used by {} actions", id, count),
                Some(id),
            ));
        }
    }
}

pub fn v040_links_resolve(graph: &FlowGraph<'_>, findings: &mut Vec<Finding>) {
    for link in &graph.dangling_links {
        findings.push(Finding::error(
            "V040",
            format!(
                "Action '{}' links via '{}' to unknown action '{}'",
                link.source, link.kind, link.target
            ),
            Some(&link.source),
        ));
    }
}

pub fn w002_unreachable_actions(graph: &FlowGraph<'_>, findings: &mut Vec<Finding>) {
    // Without a resolvable entry every action would be flagged; V004/V020 cover it.
    if graph.entry().is_none() {
        return;
    }
    for action in graph.unreachable() {
        findings.push(Finding::warning(
            "W002",
            format!(
                "Action '{}' is not reachable from the entry action and will never run",
                action.id()
            ),
            Some(action.id()),
        ));
    }
}
