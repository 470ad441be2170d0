use crate::constants::RECENT_HISTORY_CONTEXT;
use crate::errors::AppletflowError;
use crate::models::diff::WorkflowDiff;
use crate::models::history::{GenerationHistoryItem, HistoryLog};
use crate::models::project::{parse_generated_files, primary_document, ProjectFile};
use crate::models::snapshot::Snapshot;
use crate::models::workflow::Workflow;
use crate::services::ai::Completion;
use crate::services::prompt::generation_messages;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process "generating" flag. Advisory only, it does not cancel anything.
#[derive(Default)]
pub struct GenerationLock {
    generating: AtomicBool,
}

impl GenerationLock {
    pub fn acquire(&self) -> Result<GenerationGuard<'_>, AppletflowError> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppletflowError::Conflict("A generation is already in progress".to_string()))?;

        Ok(GenerationGuard { lock: self })
    }

    #[cfg(test)]
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, whichever way the generation ends.
pub struct GenerationGuard<'a> {
    lock: &'a GenerationLock,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.lock.generating.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct Generation {
    pub files: Vec<ProjectFile>,
    pub primary: String,
    pub diff: Option<WorkflowDiff>,
    pub history_item: GenerationHistoryItem,
    pub inserted: bool,
}

pub struct Generator<'a, C: Completion> {
    ai: &'a C,
    history: &'a Mutex<HistoryLog>,
}

impl<'a, C: Completion> Generator<'a, C> {
    pub fn new(ai: &'a C, history: &'a Mutex<HistoryLog>) -> Self {
        Generator { ai, history }
    }

    /// Validates, prompts once, parses the reply and records a history item.
    /// The history lock is taken only before and after the AI call.
    pub async fn generate(&self, workflow: &Workflow) -> Result<Generation, AppletflowError> {
        workflow.validate_for_generation()?;

        let (last, recent) = {
            let history = self.history.lock()?;

            (history.latest().cloned(), history.recent(RECENT_HISTORY_CONTEXT).to_vec())
        };

        let diff = WorkflowDiff::against_history(&workflow.nodes, &workflow.edges, last.as_ref());
        let messages = generation_messages(workflow, diff.as_ref(), &recent);

        let content = self.ai.complete(&messages).await?;
        let files = parse_generated_files(&content)?;

        let primary = primary_document(&files)
            .map(|f| f.name.clone())
            .ok_or_else(|| AppletflowError::InternalServerError("parsed project has no files".to_string()))?;

        let history_item = GenerationHistoryItem::from_snapshot(&Snapshot::build(&workflow.nodes, &workflow.edges));
        let inserted = self.history.lock()?.record(history_item.clone())?;

        log::info!(
            "generated {} file(s) for {} node(s), history {}",
            files.len(),
            workflow.nodes.len(),
            if inserted { "recorded" } else { "unchanged" }
        );

        Ok(Generation {
            files,
            primary,
            diff,
            history_item,
            inserted,
        })
    }
}
