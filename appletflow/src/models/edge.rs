use serde::{Deserialize, Serialize};

/// Directed connection between two nodes. Self loops and duplicates are allowed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

impl WorkflowEdge {
    #[cfg(test)]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        WorkflowEdge {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
