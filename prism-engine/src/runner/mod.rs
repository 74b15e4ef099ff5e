//! Fire-and-forget pipeline stage execution.
//!
//! Triggering a stage creates a pending task record and spawns the run on
//! its own tokio task, detached from the caller. The caller observes
//! progress and terminal state only by polling the tracker; execution
//! failures are recorded on the task and never propagated back.
//!
//! There is no automatic retry, cancellation, or timeout: a stuck external
//! collaborator call occupies its task until the process restarts.

use crate::progress::ProgressReporter;
use crate::stages::{PipelineStage, StageContext, StageExecutor, StageOptions};
use crate::storage::StorageGateway;
use crate::tasks::{Task, TaskTracker};
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates pipeline stage runs against registered executors.
pub struct PipelineRunner {
    tracker: Arc<TaskTracker>,
    storage: Arc<dyn StorageGateway>,
    executors: HashMap<PipelineStage, Arc<dyn StageExecutor>>,
}

impl PipelineRunner {
    /// Creates a runner with no registered executors.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            tracker: Arc::new(TaskTracker::new()),
            storage,
            executors: HashMap::new(),
        }
    }

    /// Registers the executor for a stage, replacing any previous one.
    #[must_use]
    pub fn with_executor(
        mut self,
        stage: PipelineStage,
        executor: Arc<dyn StageExecutor>,
    ) -> Self {
        self.executors.insert(stage, executor);
        self
    }

    /// Returns the task tracker.
    #[must_use]
    pub fn tracker(&self) -> Arc<TaskTracker> {
        self.tracker.clone()
    }

    /// Returns a snapshot of one task.
    #[must_use]
    pub fn task(&self, task_id: Uuid) -> Option<Task> {
        self.tracker.get(task_id)
    }

    /// Lists tasks, optionally filtered to one project.
    #[must_use]
    pub fn tasks(&self, project_id: Option<&str>) -> Vec<Task> {
        self.tracker.list(project_id)
    }

    /// Triggers a stage run and returns the pending task immediately.
    ///
    /// Must be called within a tokio runtime; the run itself proceeds on a
    /// spawned task.
    pub fn run_stage(
        &self,
        project_id: &str,
        stage: PipelineStage,
        options: StageOptions,
    ) -> Task {
        let task = self.tracker.create(project_id, stage);
        let tracker = self.tracker.clone();
        let storage = self.storage.clone();
        let executor = self.executors.get(&stage).cloned();
        let task_id = task.id;
        let project = project_id.to_string();

        tokio::spawn(async move {
            execute_stage(tracker, storage, executor, task_id, project, stage, options).await;
        });

        task
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("tasks", &self.tracker.len())
            .field("executors", &self.executors.len())
            .finish()
    }
}

async fn execute_stage(
    tracker: Arc<TaskTracker>,
    storage: Arc<dyn StorageGateway>,
    executor: Option<Arc<dyn StageExecutor>>,
    task_id: Uuid,
    project_id: String,
    stage: PipelineStage,
    options: StageOptions,
) {
    tracker.mark_running(task_id);
    tracing::info!(%task_id, project = %project_id, %stage, "stage started");

    let ctx = StageContext {
        task_id,
        project_id: project_id.clone(),
        storage,
        progress: ProgressReporter::new(tracker.clone(), task_id),
    };

    let result = match executor {
        Some(executor) => executor.run(&ctx, &options).await,
        None => Err(anyhow!("no executor registered for stage '{stage}'")),
    };

    match result {
        Ok(()) => {
            tracker.mark_completed(task_id);
            tracing::info!(%task_id, project = %project_id, %stage, "stage completed");
        }
        Err(err) => {
            let description = format!("{err:#}");
            tracing::error!(
                %task_id,
                project = %project_id,
                %stage,
                error = %description,
                "stage failed"
            );
            tracker.mark_failed(task_id, description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::tasks::TaskStatus;
    use crate::testing::{FailingStageExecutor, MockStageExecutor};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    async fn wait_terminal(runner: &PipelineRunner, task_id: Uuid) -> Task {
        for _ in 0..200 {
            if let Some(task) = runner.task(task_id) {
                if task.status.is_terminal() {
                    return task;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("task never reached a terminal state");
    }

    #[tokio::test]
    async fn test_run_stage_returns_pending_and_completes() {
        let storage = Arc::new(MemoryStorage::new());
        let executor = Arc::new(MockStageExecutor::new());
        let runner = PipelineRunner::new(storage)
            .with_executor(PipelineStage::Chunk, executor.clone());

        let task = runner.run_stage("demo", PipelineStage::Chunk, StageOptions::default());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());

        let finished = wait_terminal(&runner, task.id).await;
        assert_eq!(finished.status, TaskStatus::Completed);
        assert!(finished.started_at.is_some());
        assert!(finished.completed_at.is_some());
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_executor_failure_recorded_not_raised() {
        let storage = Arc::new(MemoryStorage::new());
        let runner = PipelineRunner::new(storage).with_executor(
            PipelineStage::Embed,
            Arc::new(FailingStageExecutor::new("embedding service down")),
        );

        let task = runner.run_stage("demo", PipelineStage::Embed, StageOptions::default());
        let finished = wait_terminal(&runner, task.id).await;

        assert_eq!(finished.status, TaskStatus::Failed);
        assert!(finished.error.unwrap().contains("embedding service down"));
        assert!(finished.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unregistered_stage_fails_task() {
        let storage = Arc::new(MemoryStorage::new());
        let runner = PipelineRunner::new(storage);

        let task = runner.run_stage("demo", PipelineStage::AgentCreate, StageOptions::default());
        let finished = wait_terminal(&runner, task.id).await;

        assert_eq!(finished.status, TaskStatus::Failed);
        assert!(finished.error.unwrap().contains("agent_create"));
    }

    #[tokio::test]
    async fn test_options_passed_through_to_executor() {
        let storage = Arc::new(MemoryStorage::new());
        let executor = Arc::new(MockStageExecutor::new());
        let runner = PipelineRunner::new(storage)
            .with_executor(PipelineStage::Process, executor.clone());

        let task = runner.run_stage("demo", PipelineStage::Process, StageOptions::forced());
        wait_terminal(&runner, task.id).await;

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].project_id, "demo");
        assert!(calls[0].options.force);
    }

    #[tokio::test]
    async fn test_executor_progress_lands_on_task() {
        let storage = Arc::new(MemoryStorage::new());
        let executor = Arc::new(MockStageExecutor::new().with_progress(2, 4, "halfway"));
        let runner = PipelineRunner::new(storage)
            .with_executor(PipelineStage::Chunk, executor);

        let task = runner.run_stage("demo", PipelineStage::Chunk, StageOptions::default());
        let finished = wait_terminal(&runner, task.id).await;

        assert_eq!(finished.progress.current, 2);
        assert_eq!(finished.progress.percent, 50.0);
        assert_eq!(finished.progress.message, "halfway");
    }
}
