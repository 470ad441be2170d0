use crate::constants::WORKFLOW_KEY;
use crate::models::workflow::Workflow;
use crate::services::local_store::LocalStore;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Handle to the debounced workflow writer.
#[derive(Clone)]
pub struct Autosave {
    tx: mpsc::UnboundedSender<()>,
}

impl Autosave {
    /// Spawns the writer. The graph is persisted once `delay` passes without a new notification.
    pub fn spawn(workflow: Arc<RwLock<Workflow>>, store: LocalStore, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(autosave_task(workflow, store, delay, rx));

        Autosave { tx }
    }

    pub fn notify(&self) {
        if self.tx.send(()).is_err() {
            log::warn!("autosave task is not running, workflow change not scheduled");
        }
    }
}

async fn autosave_task(
    workflow: Arc<RwLock<Workflow>>,
    store: LocalStore,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<()>,
) {
    while rx.recv().await.is_some() {
        loop {
            match time::timeout(delay, rx.recv()).await {
                // another edit inside the window
                Ok(Some(())) => continue,
                // every handle dropped: flush and stop
                Ok(None) => {
                    persist(&workflow, &store);
                    return;
                }
                Err(_) => break,
            }
        }

        persist(&workflow, &store);
    }
}

fn persist(workflow: &RwLock<Workflow>, store: &LocalStore) {
    let snapshot = match workflow.read() {
        Ok(workflow) => workflow.clone(),
        Err(e) => {
            log::error!("Autosave skipped, workflow lock poisoned: {}", e);
            return;
        }
    };

    match store.set(WORKFLOW_KEY, &snapshot) {
        Ok(()) => log::info!("Autosaved workflow with {} node(s)", snapshot.nodes.len()),
        Err(e) => log::error!("Autosave failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::NodeType;
    use crate::models::snapshot::tests::node;

    #[tokio::test]
    async fn persists_after_quiet_window() {
        let workflow = Arc::new(RwLock::new(Workflow::default()));
        let store = LocalStore::memory();
        let autosave = Autosave::spawn(workflow.clone(), store.clone(), Duration::from_millis(50));

        workflow
            .write()
            .unwrap()
            .replace(vec![node("A", NodeType::Input, "a")], vec![])
            .unwrap();
        autosave.notify();
        autosave.notify();

        assert!(store.get::<Workflow>(WORKFLOW_KEY).is_none());

        time::sleep(Duration::from_millis(300)).await;

        let saved: Workflow = store.get(WORKFLOW_KEY).unwrap();
        assert_eq!(saved.nodes.len(), 1);
    }

    #[tokio::test]
    async fn flushes_pending_change_when_handles_drop() {
        let workflow = Arc::new(RwLock::new(Workflow::default()));
        let store = LocalStore::memory();
        let autosave = Autosave::spawn(workflow.clone(), store.clone(), Duration::from_secs(60));

        autosave.notify();
        drop(autosave);

        time::sleep(Duration::from_millis(100)).await;

        assert!(store.get::<Workflow>(WORKFLOW_KEY).is_some());
    }
}
