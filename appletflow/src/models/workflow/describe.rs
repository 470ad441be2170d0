use crate::errors::AppletflowError;
use crate::models::node::NodeType;
use crate::models::workflow::Workflow;

impl Workflow {
    /// Generation preconditions: a non-empty graph where every node has a description.
    pub fn validate_for_generation(&self) -> Result<(), AppletflowError> {
        if self.is_empty() {
            return Err(AppletflowError::ValidationError((
                "nodes".to_string(),
                "Add at least one node to the workflow before generating".to_string(),
            )));
        }

        let missing: Vec<&str> = self
            .nodes
            .iter()
            .filter(|n| n.description().is_none())
            .map(|n| n.label())
            .collect();

        if !missing.is_empty() {
            return Err(AppletflowError::ValidationError((
                "description".to_string(),
                format!("Add a description to: {}", missing.join(", ")),
            )));
        }

        Ok(())
    }

    /// Workflow in words, grouped by node type.
    pub fn describe(&self) -> String {
        let mut sections = Vec::with_capacity(NodeType::DESCRIBE_ORDER.len());

        for node_type in NodeType::DESCRIBE_ORDER {
            let lines: Vec<String> = self
                .nodes
                .iter()
                .filter(|n| n.node_type() == node_type)
                .map(|n| format!("- {}: {}", n.label(), n.description().unwrap_or("")))
                .collect();

            if !lines.is_empty() {
                sections.push(format!("{}:\n{}", node_type.heading(), lines.join("\n")));
            }
        }

        sections.join("\n\n")
    }

    /// Edges rendered by label, one `source -> target` per line.
    pub fn describe_connections(&self) -> String {
        self.edges
            .iter()
            .map(|e| format!("- {} -> {}", self.label_of(&e.source), self.label_of(&e.target)))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
