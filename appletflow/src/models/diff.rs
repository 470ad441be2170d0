use crate::models::edge::WorkflowEdge;
use crate::models::history::GenerationHistoryItem;
use crate::models::node::WorkflowNode;
use crate::models::snapshot::{NodeSnapshot, Snapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const NO_CHANGES_SUMMARY: &str = "No changes from previous";

/// Change counts between a graph and an earlier generation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDiff {
    pub added_nodes: usize,
    pub removed_nodes: usize,
    pub modified_nodes: usize,
    pub added_edges: usize,
    pub removed_edges: usize,
    pub summary: String,
}

impl WorkflowDiff {
    /// `None` means nothing changed. A missing `last` (or one without snapshot data) counts every
    /// current node and edge as added.
    pub fn against_history(
        nodes: &[WorkflowNode],
        edges: &[WorkflowEdge],
        last: Option<&GenerationHistoryItem>,
    ) -> Option<WorkflowDiff> {
        let current = Snapshot::build(nodes, edges);

        match last.and_then(GenerationHistoryItem::snapshot) {
            Some((prev_nodes, prev_edges)) => Self::compare(&current.nodes, &current.edges, prev_nodes, prev_edges),
            None => Self::all_added(current.nodes.len(), current.edges.len()),
        }
    }

    /// Every node and edge counted as added, duplicate edges included.
    fn all_added(nodes: usize, edges: usize) -> Option<WorkflowDiff> {
        let mut diff = WorkflowDiff {
            added_nodes: nodes,
            added_edges: edges,
            ..WorkflowDiff::default()
        };

        if diff.is_unchanged() {
            return None;
        }

        diff.summary = diff.summarize();

        Some(diff)
    }

    /// Summary of `current` relative to the generation before it. `None` when either lacks snapshots.
    pub fn between(current: &GenerationHistoryItem, previous: &GenerationHistoryItem) -> Option<String> {
        let (curr_nodes, curr_edges) = current.snapshot()?;
        let (prev_nodes, prev_edges) = previous.snapshot()?;

        let summary = Self::compare(curr_nodes, curr_edges, prev_nodes, prev_edges)
            .map(|diff| diff.summary)
            .unwrap_or_else(|| NO_CHANGES_SUMMARY.to_string());

        Some(summary)
    }

    pub fn compare(
        curr_nodes: &[NodeSnapshot],
        curr_edges: &[WorkflowEdge],
        prev_nodes: &[NodeSnapshot],
        prev_edges: &[WorkflowEdge],
    ) -> Option<WorkflowDiff> {
        let prev_by_id: HashMap<&str, &NodeSnapshot> = prev_nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let curr_by_id: HashMap<&str, &NodeSnapshot> = curr_nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut diff = WorkflowDiff::default();

        for (id, node) in &curr_by_id {
            match prev_by_id.get(id) {
                None => diff.added_nodes += 1,
                Some(prev) if !node.same_content(prev) => diff.modified_nodes += 1,
                Some(_) => {}
            }
        }

        diff.removed_nodes = prev_by_id.keys().filter(|id| !curr_by_id.contains_key(*id)).count();

        let prev_edge_keys: HashSet<String> = prev_edges.iter().map(Self::edge_key).collect();
        let curr_edge_keys: HashSet<String> = curr_edges.iter().map(Self::edge_key).collect();

        diff.added_edges = curr_edge_keys.difference(&prev_edge_keys).count();
        diff.removed_edges = prev_edge_keys.difference(&curr_edge_keys).count();

        if diff.is_unchanged() {
            return None;
        }

        diff.summary = diff.summarize();

        Some(diff)
    }

    /// Join key for edge set comparison. Distinct from the snapshot sort key.
    pub fn edge_key(edge: &WorkflowEdge) -> String {
        format!("{}->{}", edge.source, edge.target)
    }

    pub fn is_unchanged(&self) -> bool {
        self.added_nodes == 0
            && self.removed_nodes == 0
            && self.modified_nodes == 0
            && self.added_edges == 0
            && self.removed_edges == 0
    }

    fn summarize(&self) -> String {
        let mut parts = Vec::with_capacity(5);

        if self.added_nodes > 0 {
            parts.push(format!("+{} node", self.added_nodes));
        }
        if self.removed_nodes > 0 {
            parts.push(format!("-{} node", self.removed_nodes));
        }
        if self.modified_nodes > 0 {
            parts.push(format!("~{} node changed", self.modified_nodes));
        }
        if self.added_edges > 0 {
            parts.push(format!("+{} edge", self.added_edges));
        }
        if self.removed_edges > 0 {
            parts.push(format!("-{} edge", self.removed_edges));
        }

        parts.join(", ")
    }
}
