//! petgraph-based arena view over a flow's actions.
//!
//! The flow's `actions` vector is the arena. Each graph node carries the
//! action's position in that vector and edges carry the [`LinkKind`] they were
//! declared under. The graph represents whatever it is given: dangling links
//! are recorded rather than rejected, and a duplicated id resolves to its first
//! definition.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use super::types::{Action, Flow, LinkKind};

/// A link whose target id does not name any action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    pub source: String,
    pub kind: LinkKind,
    pub target: String,
}

pub struct FlowGraph<'a> {
    pub flow: &'a Flow,
    pub graph: DiGraph<usize, LinkKind>,
    pub node_indices: HashMap<&'a str, NodeIndex>,
    /// Graph node for each arena position (duplicates get their own node).
    pub positions: Vec<NodeIndex>,
    pub dangling_links: Vec<DanglingLink>,
}

impl<'a> FlowGraph<'a> {
    pub fn build(flow: &'a Flow) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut positions = Vec::with_capacity(flow.actions.len());

        for (pos, action) in flow.actions.iter().enumerate() {
            let idx = graph.add_node(pos);
            positions.push(idx);
            node_indices.entry(action.id()).or_insert(idx);
        }

        let mut dangling_links = Vec::new();
        for (pos, action) in flow.actions.iter().enumerate() {
            for (kind, target) in action.links() {
                match node_indices.get(target) {
                    Some(&t) => {
                        graph.add_edge(positions[pos], t, kind);
                    }
                    None => dangling_links.push(DanglingLink {
                        source: action.id().to_string(),
                        kind,
                        target: target.to_string(),
                    }),
                }
            }
        }

        FlowGraph {
            flow,
            graph,
            node_indices,
            positions,
            dangling_links,
        }
    }

    pub fn action(&self, id: &str) -> Option<&'a Action> {
        let idx = self.node_indices.get(id)?;
        self.flow.actions.get(self.graph[*idx])
    }

    /// Arena position of the action an id resolves to.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.node_indices.get(id).map(|idx| self.graph[*idx])
    }

    pub fn entry(&self) -> Option<&'a Action> {
        self.flow.entry_action_id.as_deref().and_then(|id| self.action(id))
    }

    /// Follow one typed link from an action, if both exist.
    pub fn follow(&self, id: &str, kind: LinkKind) -> Option<&'a Action> {
        let target = self.action(id)?.link(kind)?;
        self.action(target)
    }

    /// Resolved successors in link order.
    pub fn successors(&self, id: &str) -> Vec<(LinkKind, &'a Action)> {
        let Some(action) = self.action(id) else {
            return vec![];
        };
        action
            .links()
            .into_iter()
            .filter_map(|(kind, target)| self.action(target).map(|a| (kind, a)))
            .collect()
    }

    pub fn predecessors(&self, id: &str) -> Vec<&'a Action> {
        let Some(&idx) = self.node_indices.get(id) else {
            return vec![];
        };
        let mut seen = HashSet::new();
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter(|n| seen.insert(*n))
            .filter_map(|n| self.flow.actions.get(self.graph[n]))
            .collect()
    }

    pub fn incoming_count(&self, id: &str) -> usize {
        self.predecessors(id).len()
    }

    /// Arena positions reachable from the entry action (empty if the entry
    /// does not resolve).
    pub fn reachable_from_entry(&self) -> HashSet<usize> {
        let mut reachable = HashSet::new();
        let Some(start) = self
            .flow
            .entry_action_id
            .as_deref()
            .and_then(|id| self.node_indices.get(id))
        else {
            return reachable;
        };

        let mut dfs = Dfs::new(&self.graph, *start);
        while let Some(nx) = dfs.next(&self.graph) {
            reachable.insert(self.graph[nx]);
        }
        reachable
    }

    /// Actions not reachable from the entry, in definition order.
    pub fn unreachable(&self) -> Vec<&'a Action> {
        let reachable = self.reachable_from_entry();
        self.flow
            .actions
            .iter()
            .enumerate()
            .filter(|(pos, _)| !reachable.contains(pos))
            .map(|(_, a)| a)
            .collect()
    }
}
