use crate::errors::AppletflowError;
use serde::{Deserialize, Serialize};

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeType {
    Input,
    Show,
    Action,
}

impl NodeType {
    /// Order in which node groups are described to the AI: inputs feed actions, actions feed views.
    pub const DESCRIBE_ORDER: [NodeType; 3] = [NodeType::Input, NodeType::Action, NodeType::Show];

    pub fn heading(&self) -> &'static str {
        match self {
            NodeType::Input => "Input nodes (collect data from the user)",
            NodeType::Action => "Action nodes (process or transform data)",
            NodeType::Show => "Show nodes (display results to the user)",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeData {
    pub label: String,

    #[serde(rename = "nodeType")]
    pub node_type: NodeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Legacy per-node code, no longer produced by generations.
    #[serde(rename = "generatedCode", default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
}

/// Node as the editor sends and stores it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    pub data: NodeData,
}

impl WorkflowNode {
    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn node_type(&self) -> NodeType {
        self.data.node_type
    }

    pub fn description(&self) -> Option<&str> {
        self.data
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Input for creating or editing a node.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub label: String,
    pub node_type: NodeType,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub position: Option<Position>,
}

impl NodeDraft {
    pub fn validate(&self) -> Result<(), AppletflowError> {
        if self.label.trim().is_empty() {
            return Err(AppletflowError::ValidationError((
                "label".to_string(),
                "can not be blank".to_string(),
            )));
        }

        Ok(())
    }

    pub fn into_data(self) -> NodeData {
        NodeData {
            label: self.label,
            node_type: self.node_type,
            description: self.description,
            prompt: self.prompt,
            generated_code: None,
        }
    }
}
