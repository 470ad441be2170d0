mod describe;
mod mutations;

use crate::constants::WORKFLOW_VERSION;
use crate::models::edge::WorkflowEdge;
use crate::models::node::WorkflowNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow graph as edited in the browser and persisted under `WORKFLOW_KEY`.
///
/// Nodes are never executed. Edges only describe the intended data flow
/// and are handed to the AI as context.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workflow {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,

    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    WORKFLOW_VERSION
}

impl Default for Workflow {
    fn default() -> Self {
        Workflow {
            nodes: Vec::new(),
            edges: Vec::new(),
            timestamp: Utc::now(),
            version: WORKFLOW_VERSION,
        }
    }
}

impl Workflow {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Label of the node with `id`, falling back to the id itself.
    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map(WorkflowNode::label).unwrap_or(id)
    }
}
