use crate::models::diff::{WorkflowDiff, NO_CHANGES_SUMMARY};
use crate::models::history::GenerationHistoryItem;
use crate::models::workflow::Workflow;
use crate::services::ai::AiMessage;

const SYSTEM_PROMPT: &str = "You are an expert frontend developer. You turn a workflow of input, action and show \
steps into one working single-page web application.

Rules:
- The app is static: HTML, CSS and vanilla JavaScript only, no build step, no server code.
- Input steps become form controls, action steps become JavaScript logic, show steps become rendered output.
- Wire the steps together in the order given by the connections.
- index.html is the entry point and must reference every other file by relative path.

Respond with JSON only, no prose and no markdown:
{\"files\": [{\"name\": \"index.html\", \"content\": \"...\"}, {\"name\": \"style.css\", \"content\": \"...\"}]}";

/// Ordered messages for one generation request.
pub fn generation_messages(
    workflow: &Workflow,
    diff: Option<&WorkflowDiff>,
    recent: &[GenerationHistoryItem],
) -> Vec<AiMessage> {
    vec![AiMessage::system(SYSTEM_PROMPT), AiMessage::user(user_prompt(workflow, diff, recent))]
}

fn user_prompt(workflow: &Workflow, diff: Option<&WorkflowDiff>, recent: &[GenerationHistoryItem]) -> String {
    let mut prompt = format!("Workflow steps:\n\n{}", workflow.describe());

    let connections = workflow.describe_connections();
    if !connections.is_empty() {
        prompt.push_str("\n\nConnections:\n");
        prompt.push_str(&connections);
    }

    if !recent.is_empty() {
        let change = diff.map(|d| d.summary.as_str()).unwrap_or(NO_CHANGES_SUMMARY);
        prompt.push_str("\n\nChanges since the last generation: ");
        prompt.push_str(change);

        prompt.push_str("\n\nRecent generations (newest first):");
        for item in recent {
            prompt.push_str(&format!(
                "\n- {}: {} nodes, {} edges ({})\n{}",
                item.created_at.to_rfc3339(),
                item.total_nodes,
                item.total_edges,
                item.node_labels.join(", "),
                item.mermaid
            ));
        }
    }

    prompt.push_str("\n\nGenerate the complete application now.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::edge::WorkflowEdge;
    use crate::models::node::NodeType;
    use crate::models::snapshot::tests::node;
    use crate::models::snapshot::Snapshot;
    use crate::services::ai::AiRole;

    fn workflow() -> Workflow {
        let mut workflow = Workflow::default();
        workflow
            .replace(
                vec![node("Name", NodeType::Input, "collect name"), node("Greet", NodeType::Show, "say hi")],
                vec![WorkflowEdge::new("Name", "Greet")],
            )
            .unwrap();

        workflow
    }

    #[test]
    fn first_generation_has_no_history_section() {
        let messages = generation_messages(&workflow(), None, &[]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, AiRole::System);
        assert!(messages[0].content.contains("{\"files\""));

        let user = &messages[1].content;
        assert!(user.contains("- Name: collect name"));
        assert!(user.contains("- Name -> Greet"));
        assert!(!user.contains("Recent generations"));
    }

    #[test]
    fn includes_change_summary_and_recent_items() {
        let workflow = workflow();
        let previous = GenerationHistoryItem::from_snapshot(&Snapshot::build(&workflow.nodes[..1], &[]));
        let diff = WorkflowDiff::against_history(&workflow.nodes, &workflow.edges, Some(&previous));

        let messages = generation_messages(&workflow, diff.as_ref(), std::slice::from_ref(&previous));
        let user = &messages[1].content;

        assert!(user.contains("Changes since the last generation: +1 node, +1 edge"));
        assert!(user.contains("1 nodes, 0 edges (Name)"));
        assert!(user.contains("graph TD"));
    }
}
