//! Task records and the thread-safe task tracker.
//!
//! A task represents one asynchronous execution of a pipeline stage. Records
//! are created when a run is requested, mutated only through the tracker's
//! update API by the single executor that owns the run, and never deleted.
//! The registry is process-lifetime and unbounded; a retention policy is an
//! open question left to callers with long-lived processes.

use crate::stages::PipelineStage;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// The lifecycle status of a task.
///
/// Transitions are pending -> running -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Fractional completion of a running task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Current item number (1-indexed while running).
    pub current: u64,
    /// Total number of items, when known.
    pub total: u64,
    /// Percent complete; 0 when `total` is 0.
    pub percent: f64,
    /// Description of the current operation.
    pub message: String,
}

/// One asynchronous execution of a pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, generated at creation.
    pub id: Uuid,
    /// The project the run is scoped to.
    pub project_id: String,
    /// The stage being executed.
    pub stage: PipelineStage,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Set exactly once, at the pending -> running transition.
    pub started_at: Option<DateTime<Utc>>,
    /// Set exactly once, at transition into a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure description; populated only on failure.
    pub error: Option<String>,
    /// Progress reported by the executor.
    pub progress: TaskProgress,
}

/// Thread-safe, in-memory registry of task records.
///
/// All mutation and iteration occur under one lock scoped to the tracker.
/// Field updates for a given task are only ever issued by the single
/// executor that owns it, so cross-call update sequences need no further
/// coordination.
#[derive(Default)]
pub struct TaskTracker {
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl TaskTracker {
    /// Creates a new empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pending task for a stage run and inserts it.
    pub fn create(&self, project_id: impl Into<String>, stage: PipelineStage) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            stage,
            status: TaskStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
            progress: TaskProgress::default(),
        };
        self.tasks.lock().insert(task.id, task.clone());
        task
    }

    /// Applies an update to the named task. Unknown ids are a no-op; callers
    /// that need existence guarantees must check via [`Self::get`] first.
    pub fn update(&self, task_id: Uuid, f: impl FnOnce(&mut Task)) {
        if let Some(task) = self.tasks.lock().get_mut(&task_id) {
            f(task);
        }
    }

    /// Transitions a task to running, recording `started_at` exactly once.
    pub fn mark_running(&self, task_id: Uuid) {
        self.update(task_id, |task| {
            task.status = TaskStatus::Running;
            if task.started_at.is_none() {
                task.started_at = Some(Utc::now());
            }
        });
    }

    /// Transitions a task to completed, recording `completed_at` exactly once.
    pub fn mark_completed(&self, task_id: Uuid) {
        self.update(task_id, |task| {
            task.status = TaskStatus::Completed;
            if task.completed_at.is_none() {
                task.completed_at = Some(Utc::now());
            }
        });
    }

    /// Transitions a task to failed with an error description.
    pub fn mark_failed(&self, task_id: Uuid, error: impl Into<String>) {
        self.update(task_id, |task| {
            task.status = TaskStatus::Failed;
            task.error = Some(error.into());
            if task.completed_at.is_none() {
                task.completed_at = Some(Utc::now());
            }
        });
    }

    /// Updates a task's progress, recomputing the percentage.
    pub fn update_progress(
        &self,
        task_id: Uuid,
        current: u64,
        total: u64,
        message: impl Into<String>,
    ) {
        self.update(task_id, |task| {
            task.progress.current = current;
            task.progress.total = total;
            task.progress.message = message.into();
            task.progress.percent = if total > 0 {
                current as f64 / total as f64 * 100.0
            } else {
                0.0
            };
        });
    }

    /// Returns a snapshot of the task, if it exists.
    #[must_use]
    pub fn get(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.lock().get(&task_id).cloned()
    }

    /// Lists tasks, optionally filtered to one project, sorted by
    /// `started_at` descending with never-started tasks last.
    #[must_use]
    pub fn list(&self, project_id: Option<&str>) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .values()
            .filter(|task| project_id.map_or(true, |p| task.project_id == p))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            let a_key = a.started_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
            let b_key = b.started_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
            b_key.cmp(&a_key)
        });
        tasks
    }

    /// Returns the number of tracked tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns true if no tasks are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_starts_pending_without_timestamps() {
        let tracker = TaskTracker::new();
        let task = tracker.create("p1", PipelineStage::Chunk);

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
        assert!(task.error.is_none());
        assert_eq!(task.progress, TaskProgress::default());
    }

    #[test]
    fn test_started_at_set_exactly_once() {
        let tracker = TaskTracker::new();
        let task = tracker.create("p1", PipelineStage::Embed);

        tracker.mark_running(task.id);
        let first = tracker.get(task.id).unwrap().started_at;
        assert!(first.is_some());

        tracker.mark_running(task.id);
        tracker.update_progress(task.id, 1, 2, "half");
        assert_eq!(tracker.get(task.id).unwrap().started_at, first);
    }

    #[test]
    fn test_completed_at_set_once_at_terminal_transition() {
        let tracker = TaskTracker::new();
        let task = tracker.create("p1", PipelineStage::Process);

        tracker.mark_running(task.id);
        tracker.mark_completed(task.id);
        let stamped = tracker.get(task.id).unwrap().completed_at;
        assert!(stamped.is_some());

        tracker.mark_completed(task.id);
        assert_eq!(tracker.get(task.id).unwrap().completed_at, stamped);
    }

    #[test]
    fn test_mark_failed_records_error() {
        let tracker = TaskTracker::new();
        let task = tracker.create("p1", PipelineStage::IndexUpload);

        tracker.mark_running(task.id);
        tracker.mark_failed(task.id, "upload rejected");

        let task = tracker.get(task.id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("upload rejected"));
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_update_progress_computes_percent() {
        let tracker = TaskTracker::new();
        let task = tracker.create("p1", PipelineStage::Chunk);

        tracker.update_progress(task.id, 3, 10, "msg");
        let progress = tracker.get(task.id).unwrap().progress;
        assert_eq!(progress.percent, 30.0);
        assert_eq!(progress.message, "msg");

        tracker.update_progress(task.id, 0, 0, "msg");
        assert_eq!(tracker.get(task.id).unwrap().progress.percent, 0.0);
    }

    #[test]
    fn test_update_unknown_task_is_noop() {
        let tracker = TaskTracker::new();
        tracker.update_progress(Uuid::new_v4(), 1, 2, "ignored");
        tracker.mark_failed(Uuid::new_v4(), "ignored");
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_list_filters_by_project() {
        let tracker = TaskTracker::new();
        let a = tracker.create("p1", PipelineStage::Chunk);
        tracker.create("p2", PipelineStage::Chunk);

        let tasks = tracker.list(Some("p1"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, a.id);
    }

    #[test]
    fn test_list_sorts_started_descending_with_unstarted_last() {
        let tracker = TaskTracker::new();
        let older = tracker.create("p1", PipelineStage::Process);
        let newer = tracker.create("p1", PipelineStage::Chunk);
        let unstarted = tracker.create("p1", PipelineStage::Embed);

        tracker.update(older.id, |t| {
            t.started_at = Some(Utc::now() - chrono::Duration::minutes(5));
        });
        tracker.update(newer.id, |t| {
            t.started_at = Some(Utc::now());
        });

        let tasks = tracker.list(Some("p1"));
        assert_eq!(tasks[0].id, newer.id);
        assert_eq!(tasks[1].id, older.id);
        assert_eq!(tasks[2].id, unstarted.id);
    }

    #[test]
    fn test_status_terminality() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&TaskStatus::Running).unwrap();
        assert_eq!(json, r#""running""#);
    }
}
