use crate::models::edge::WorkflowEdge;
use crate::models::node::{NodeType, WorkflowNode};
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: String,
    pub label: String,

    #[serde(rename = "nodeType")]
    pub node_type: NodeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(rename = "generatedCode", default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
}

impl NodeSnapshot {
    /// Content equality with absent texts read as empty.
    pub fn same_content(&self, other: &NodeSnapshot) -> bool {
        fn text(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }

        self.label == other.label
            && self.node_type == other.node_type
            && text(&self.description) == text(&other.description)
            && text(&self.prompt) == text(&other.prompt)
            && text(&self.generated_code) == text(&other.generated_code)
    }
}

impl From<&WorkflowNode> for NodeSnapshot {
    fn from(node: &WorkflowNode) -> Self {
        NodeSnapshot {
            id: node.id.clone(),
            label: node.data.label.clone(),
            node_type: node.data.node_type,
            description: node.data.description.clone(),
            prompt: node.data.prompt.clone(),
            generated_code: node.data.generated_code.clone(),
        }
    }
}

/// Serialized form the hash is computed over. Field order is fixed by the struct.
#[derive(Serialize)]
struct CanonicalForm<'a> {
    n: &'a [NodeSnapshot],
    e: &'a [WorkflowEdge],
}

/// Order-normalized projection of a graph. Node positions are not part of it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<WorkflowEdge>,
    pub hash: String,
}

impl Snapshot {
    pub fn build(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Snapshot {
        let mut nodes: Vec<NodeSnapshot> = nodes.iter().map(NodeSnapshot::from).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<WorkflowEdge> = edges.to_vec();
        edges.sort_by_cached_key(|edge| (Self::edge_sort_key(edge), edge.id.clone()));

        let hash = Self::compute_hash(&nodes, &edges);

        Snapshot { nodes, edges, hash }
    }

    pub fn edge_sort_key(edge: &WorkflowEdge) -> String {
        format!("{}:{}", edge.source, edge.target)
    }

    /// 64-bit FNV-1a over the canonical JSON, rendered as `h` + lowercase hex.
    pub fn compute_hash(nodes: &[NodeSnapshot], edges: &[WorkflowEdge]) -> String {
        // structs of plain strings always serialize
        let canonical = serde_json::to_vec(&CanonicalForm { n: nodes, e: edges }).unwrap_or_default();

        let mut hasher = FnvHasher::default();
        hasher.write(&canonical);

        format!("h{:x}", hasher.finish())
    }

    pub fn mermaid(&self) -> String {
        mermaid(&self.nodes, &self.edges)
    }
}

pub fn mermaid(nodes: &[NodeSnapshot], edges: &[WorkflowEdge]) -> String {
    let mut lines = Vec::with_capacity(1 + nodes.len() + edges.len());
    lines.push("graph TD".to_string());

    for node in nodes {
        let label = if node.label.is_empty() { &node.id } else { &node.label };
        let safe_label = label.replace(|c: char| c == '\n' || c == '\r', " ").replace('"', "\\\"");

        lines.push(format!("{}[\"{}\"]", node.id, safe_label));
    }

    for edge in edges {
        lines.push(format!("{}-->{}", edge.source, edge.target));
    }

    lines.join("\n")
}
