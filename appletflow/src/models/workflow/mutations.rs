use crate::errors::AppletflowError;
use crate::models::edge::WorkflowEdge;
use crate::models::node::{NodeDraft, WorkflowNode};
use crate::models::workflow::Workflow;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

impl Workflow {
    pub fn add_node(&mut self, draft: NodeDraft, id: Option<String>) -> Result<&WorkflowNode, AppletflowError> {
        draft.validate()?;

        let id = id.unwrap_or_else(|| format!("node-{}", Uuid::new_v4()));
        if self.node(&id).is_some() {
            return Err(AppletflowError::ValidationError((
                "id".to_string(),
                format!("node {} already exists", id),
            )));
        }

        let position = draft.position;
        let mut nodes = self.nodes.clone();
        nodes.push(WorkflowNode {
            id,
            position,
            data: draft.into_data(),
        });
        self.nodes = nodes;
        self.touch();

        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Replaces the editable fields of a node. Legacy generated code is kept.
    pub fn update_node(&mut self, id: &str, draft: NodeDraft) -> Result<&WorkflowNode, AppletflowError> {
        draft.validate()?;

        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AppletflowError::NotFound(format!("Node {} not found", id)))?;

        let mut nodes = self.nodes.clone();
        let node = &mut nodes[index];
        let generated_code = node.data.generated_code.take();

        if draft.position.is_some() {
            node.position = draft.position;
        }
        node.data = draft.into_data();
        node.data.generated_code = generated_code;

        self.nodes = nodes;
        self.touch();

        Ok(&self.nodes[index])
    }

    /// Removes the node and every edge touching it.
    pub fn delete_node(&mut self, id: &str) -> Result<WorkflowNode, AppletflowError> {
        let node = self
            .node(id)
            .cloned()
            .ok_or_else(|| AppletflowError::NotFound(format!("Node {} not found", id)))?;

        self.nodes = self.nodes.iter().filter(|n| n.id != id).cloned().collect();
        self.edges = self.edges.iter().filter(|e| !e.touches(id)).cloned().collect();
        self.touch();

        Ok(node)
    }

    pub fn add_edge(&mut self, mut edge: WorkflowEdge) -> Result<&WorkflowEdge, AppletflowError> {
        for (field, endpoint) in [("source", &edge.source), ("target", &edge.target)] {
            if self.node(endpoint).is_none() {
                return Err(AppletflowError::ValidationError((
                    field.to_string(),
                    format!("node {} does not exist", endpoint),
                )));
            }
        }

        if edge.id.is_none() {
            edge.id = Some(format!("e-{}-{}", edge.source, edge.target));
        }

        let mut edges = self.edges.clone();
        edges.push(edge);
        self.edges = edges;
        self.touch();

        Ok(&self.edges[self.edges.len() - 1])
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<(), AppletflowError> {
        if !self.edges.iter().any(|e| e.id.as_deref() == Some(id)) {
            return Err(AppletflowError::NotFound(format!("Edge {} not found", id)));
        }

        self.edges = self
            .edges
            .iter()
            .filter(|e| e.id.as_deref() != Some(id))
            .cloned()
            .collect();
        self.touch();

        Ok(())
    }

    /// Wholesale save of the editor state.
    pub fn replace(&mut self, nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Result<(), AppletflowError> {
        let mut seen = HashSet::with_capacity(nodes.len());

        for node in &nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(AppletflowError::ValidationError((
                    "nodes".to_string(),
                    format!("duplicate node id {}", node.id),
                )));
            }
        }

        self.nodes = nodes;
        self.edges = edges;
        self.touch();

        Ok(())
    }

    fn touch(&mut self) {
        self.timestamp = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::NodeType;
    use crate::models::snapshot::tests::node;

    fn draft(label: &str, node_type: NodeType) -> NodeDraft {
        NodeDraft {
            label: label.to_string(),
            node_type,
            description: Some(format!("{} description", label)),
            prompt: None,
            position: None,
        }
    }

    #[test]
    fn add_node_mints_id_and_rejects_duplicates() {
        let mut workflow = Workflow::default();

        let minted = workflow.add_node(draft("Name", NodeType::Input), None).unwrap().id.clone();
        assert!(minted.starts_with("node-"));

        workflow.add_node(draft("Greet", NodeType::Show), Some("B".to_string())).unwrap();
        let duplicate = workflow.add_node(draft("Again", NodeType::Show), Some("B".to_string()));

        assert!(matches!(duplicate, Err(AppletflowError::ValidationError(_))));
        assert_eq!(workflow.nodes.len(), 2);
    }

    #[test]
    fn delete_node_cascades_to_edges() {
        let mut workflow = Workflow::default();
        workflow
            .replace(
                vec![
                    node("A", NodeType::Input, "a"),
                    node("B", NodeType::Action, "b"),
                    node("C", NodeType::Show, "c"),
                ],
                vec![
                    WorkflowEdge::new("A", "B"),
                    WorkflowEdge::new("B", "C"),
                    WorkflowEdge::new("A", "C"),
                ],
            )
            .unwrap();

        workflow.delete_node("B").unwrap();

        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.edges, vec![WorkflowEdge::new("A", "C")]);
    }

    #[test]
    fn add_edge_requires_existing_endpoints() {
        let mut workflow = Workflow::default();
        workflow.replace(vec![node("A", NodeType::Input, "a")], vec![]).unwrap();

        let missing = workflow.add_edge(WorkflowEdge::new("A", "Z"));
        assert!(matches!(missing, Err(AppletflowError::ValidationError(_))));

        let self_loop = workflow.add_edge(WorkflowEdge::new("A", "A")).unwrap();
        assert_eq!(self_loop.id.as_deref(), Some("e-A-A"));
    }

    #[test]
    fn update_node_keeps_legacy_code() {
        let mut workflow = Workflow::default();
        let mut legacy = node("A", NodeType::Input, "a");
        legacy.data.generated_code = Some("<form></form>".to_string());
        workflow.replace(vec![legacy], vec![]).unwrap();

        let updated = workflow.update_node("A", draft("Renamed", NodeType::Action)).unwrap();

        assert_eq!(updated.label(), "Renamed");
        assert_eq!(updated.node_type(), NodeType::Action);
        assert_eq!(updated.data.generated_code.as_deref(), Some("<form></form>"));
    }

    #[test]
    fn replace_rejects_duplicate_ids() {
        let mut workflow = Workflow::default();

        let result = workflow.replace(
            vec![node("A", NodeType::Input, "a"), node("A", NodeType::Show, "b")],
            vec![],
        );

        assert!(result.is_err());
        assert!(workflow.nodes.is_empty());
    }

    #[test]
    fn delete_edge_by_id() {
        let mut workflow = Workflow::default();
        workflow
            .replace(vec![node("A", NodeType::Input, "a"), node("B", NodeType::Show, "b")], vec![])
            .unwrap();
        workflow.add_edge(WorkflowEdge::new("A", "B")).unwrap();

        workflow.delete_edge("e-A-B").unwrap();

        assert!(workflow.edges.is_empty());
        assert!(matches!(workflow.delete_edge("e-A-B"), Err(AppletflowError::NotFound(_))));
    }
}
