//! Fire-and-forget section execution with results-file progress polling.

use super::store::WorkflowStore;
use super::types::Section;
use crate::errors::EngineError;
use crate::tasks::TaskStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Answers a section's questions against the indexed corpus.
///
/// Implementations must persist each answer into `output/results.json` as
/// it is produced, so progress is observable while the run is in flight.
#[async_trait]
pub trait SectionWorkflow: Send + Sync {
    /// Runs the workflow for one section to completion.
    async fn run(&self, project: &str, section: &Section) -> anyhow::Result<()>;
}

/// Tracking record for one section run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WorkflowTask {
    /// Unique task id.
    pub task_id: Uuid,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Section being run.
    pub section_id: String,
    /// Project being run against.
    pub project_id: String,
    /// Questions with a recorded answer so far.
    pub questions_completed: usize,
    /// Questions configured for the section.
    pub questions_total: usize,
    /// Question currently being answered, when known.
    pub current_question: Option<String>,
    /// Error description for failed runs.
    pub error: Option<String>,
    /// When the run left pending.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Thread-safe registry of section-run tasks.
///
/// Separate id space from the pipeline [`TaskTracker`](crate::tasks::TaskTracker);
/// records are kept for the life of the process.
#[derive(Debug, Default)]
pub struct WorkflowTaskTracker {
    tasks: Mutex<HashMap<Uuid, WorkflowTask>>,
}

impl WorkflowTaskTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending task and returns a snapshot of it.
    pub fn create(&self, project_id: &str, section_id: &str, questions_total: usize) -> WorkflowTask {
        let task = WorkflowTask {
            task_id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            section_id: section_id.to_string(),
            project_id: project_id.to_string(),
            questions_completed: 0,
            questions_total,
            current_question: None,
            error: None,
            started_at: None,
            completed_at: None,
        };
        self.tasks.lock().insert(task.task_id, task.clone());
        task
    }

    /// Applies an update to a task; no-op for unknown ids.
    pub fn update(&self, task_id: Uuid, f: impl FnOnce(&mut WorkflowTask)) {
        if let Some(task) = self.tasks.lock().get_mut(&task_id) {
            f(task);
        }
    }

    /// Returns a snapshot of one task.
    #[must_use]
    pub fn get(&self, task_id: Uuid) -> Option<WorkflowTask> {
        self.tasks.lock().get(&task_id).cloned()
    }

    fn status(&self, task_id: Uuid) -> Option<TaskStatus> {
        self.tasks.lock().get(&task_id).map(|t| t.status)
    }
}

/// Runs workflow sections fire-and-forget.
pub struct SectionRunner {
    store: WorkflowStore,
    workflow: Arc<dyn SectionWorkflow>,
    tracker: Arc<WorkflowTaskTracker>,
    poll_interval: Duration,
}

impl SectionRunner {
    /// Creates a runner over a store and a workflow collaborator.
    #[must_use]
    pub fn new(store: WorkflowStore, workflow: Arc<dyn SectionWorkflow>) -> Self {
        Self {
            store,
            workflow,
            tracker: Arc::new(WorkflowTaskTracker::new()),
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Overrides the progress-poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Returns the task tracker.
    #[must_use]
    pub fn tracker(&self) -> Arc<WorkflowTaskTracker> {
        self.tracker.clone()
    }

    /// Returns a snapshot of one task.
    #[must_use]
    pub fn task_status(&self, task_id: Uuid) -> Option<WorkflowTask> {
        self.tracker.get(task_id)
    }

    /// Triggers a section run and returns the pending task immediately.
    ///
    /// Unknown sections are rejected before any task is spawned. Must be
    /// called within a tokio runtime.
    pub async fn run_section(
        &self,
        project: &str,
        section_id: &str,
    ) -> Result<WorkflowTask, EngineError> {
        let Some(section) = self.store.get_section(project, section_id).await else {
            return Err(EngineError::section_not_found(section_id, project));
        };

        let task = self
            .tracker
            .create(project, section_id, section.questions.len());

        let store = self.store.clone();
        let workflow = self.workflow.clone();
        let tracker = self.tracker.clone();
        let poll_interval = self.poll_interval;
        let project = project.to_string();
        let task_id = task.task_id;

        tokio::spawn(async move {
            execute_section(store, workflow, tracker, poll_interval, task_id, project, section)
                .await;
        });

        Ok(task)
    }
}

impl std::fmt::Debug for SectionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionRunner")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

async fn execute_section(
    store: WorkflowStore,
    workflow: Arc<dyn SectionWorkflow>,
    tracker: Arc<WorkflowTaskTracker>,
    poll_interval: Duration,
    task_id: Uuid,
    project: String,
    section: Section,
) {
    tracker.update(task_id, |task| {
        task.status = TaskStatus::Running;
        task.started_at = Some(Utc::now());
    });
    tracing::info!(%task_id, project = %project, section = %section.id, "section run started");

    // Progress comes from the results file the workflow writes into, so a
    // crash mid-run leaves an accurate completed count behind.
    let poller = tokio::spawn(poll_progress(
        store.clone(),
        tracker.clone(),
        poll_interval,
        task_id,
        project.clone(),
        section.id.clone(),
    ));

    let result = workflow.run(&project, &section).await;
    poller.abort();

    match result {
        Ok(()) => {
            let completed = store.load_results(&project).await.recorded_count(&section.id);
            tracker.update(task_id, |task| {
                task.status = TaskStatus::Completed;
                task.questions_completed = completed;
                task.current_question = None;
                task.completed_at = Some(Utc::now());
            });
            tracing::info!(%task_id, project = %project, section = %section.id, "section run completed");
        }
        Err(err) => {
            let description = format!("{err:#}");
            tracing::error!(
                %task_id,
                project = %project,
                section = %section.id,
                error = %description,
                "section run failed"
            );
            tracker.update(task_id, |task| {
                task.status = TaskStatus::Failed;
                task.error = Some(description);
                task.completed_at = Some(Utc::now());
            });
        }
    }
}

async fn poll_progress(
    store: WorkflowStore,
    tracker: Arc<WorkflowTaskTracker>,
    poll_interval: Duration,
    task_id: Uuid,
    project: String,
    section_id: String,
) {
    loop {
        tokio::time::sleep(poll_interval).await;
        if tracker.status(task_id) != Some(TaskStatus::Running) {
            break;
        }
        let completed = store.load_results(&project).await.recorded_count(&section_id);
        tracker.update(task_id, |task| task.questions_completed = completed);
    }
}
