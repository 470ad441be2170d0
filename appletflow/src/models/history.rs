use crate::constants::{HISTORY_KEY, HISTORY_LIMIT};
use crate::errors::AppletflowError;
use crate::models::edge::WorkflowEdge;
use crate::models::node::NodeType;
use crate::models::snapshot::{NodeSnapshot, Snapshot};
use crate::services::local_store::LocalStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One successful generation. Immutable once recorded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationHistoryItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub node_labels: Vec<String>,
    pub node_types: Vec<NodeType>,
    pub total_nodes: usize,
    pub total_edges: usize,

    #[serde(default)]
    pub mermaid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes_snapshot: Option<Vec<NodeSnapshot>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges_snapshot: Option<Vec<WorkflowEdge>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_hash: Option<String>,
}

impl GenerationHistoryItem {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        GenerationHistoryItem {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            node_labels: snapshot.nodes.iter().map(|n| n.label.clone()).collect(),
            node_types: snapshot.nodes.iter().map(|n| n.node_type).collect(),
            total_nodes: snapshot.nodes.len(),
            total_edges: snapshot.edges.len(),
            mermaid: snapshot.mermaid(),
            nodes_snapshot: Some(snapshot.nodes.clone()),
            edges_snapshot: Some(snapshot.edges.clone()),
            snapshot_hash: Some(snapshot.hash.clone()),
        }
    }

    /// Both snapshot arrays, when this item carries them.
    pub fn snapshot(&self) -> Option<(&[NodeSnapshot], &[WorkflowEdge])> {
        match (&self.nodes_snapshot, &self.edges_snapshot) {
            (Some(nodes), Some(edges)) => Some((nodes, edges)),
            _ => None,
        }
    }
}

/// Capped generation history, most recent first, persisted under [`HISTORY_KEY`].
pub struct HistoryLog {
    items: Vec<GenerationHistoryItem>,
    store: LocalStore,
}

impl HistoryLog {
    /// Absent or unreadable history starts an empty log.
    pub fn load(store: LocalStore) -> Self {
        let items: Vec<GenerationHistoryItem> = store.get(HISTORY_KEY).unwrap_or_default();

        HistoryLog { items, store }
    }

    /// Prepends `item` unless its hash equals the current head's. Returns whether it was inserted.
    pub fn record(&mut self, item: GenerationHistoryItem) -> Result<bool, AppletflowError> {
        if let (Some(head), Some(hash)) = (self.items.first(), item.snapshot_hash.as_ref()) {
            if head.snapshot_hash.as_ref() == Some(hash) {
                return Ok(false);
            }
        }

        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
        self.store.set(HISTORY_KEY, &self.items)?;

        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), AppletflowError> {
        self.items.clear();
        self.store.remove(HISTORY_KEY)
    }

    pub fn latest(&self) -> Option<&GenerationHistoryItem> {
        self.items.first()
    }

    pub fn recent(&self, count: usize) -> &[GenerationHistoryItem] {
        &self.items[..count.min(self.items.len())]
    }

    pub fn items(&self) -> &[GenerationHistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
