//! The seam between the engine and external stage implementations.
//!
//! Each pipeline stage (extraction, chunking, embedding, index management)
//! is implemented by an external collaborator fulfilling [`StageExecutor`].
//! The engine hands it a [`StageContext`] carrying the project, storage
//! handle, and a progress reporter scoped to the owning task — there is no
//! process-global "current project" marker.

use crate::progress::ProgressReporter;
use crate::storage::StorageGateway;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Stage-specific run options.
///
/// The only universally recognized option is `force`, meaning "redo even if
/// already done". Anything else is passed through in `extra` for the stage
/// implementation to interpret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageOptions {
    /// Redo the stage even if its output already exists.
    #[serde(default)]
    pub force: bool,
    /// Free-form stage-specific options.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl StageOptions {
    /// Creates options with the force flag set.
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// Execution context handed to a stage executor for one run.
pub struct StageContext {
    /// The task tracking this run.
    pub task_id: Uuid,
    /// The project the stage operates on.
    pub project_id: String,
    /// Storage gateway scoped by project and relative path.
    pub storage: Arc<dyn StorageGateway>,
    /// Progress reporter bound to this run's task.
    pub progress: ProgressReporter,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("task_id", &self.task_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Trait for external stage implementations.
///
/// Executors run off the triggering caller's task; a returned error is
/// recorded on the task record and never propagated to the trigger. Whether
/// a failed run leaves partially-written output is executor-specific, and a
/// failed stage must be re-run from scratch either way.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Runs the stage to completion for the context's project.
    async fn run(&self, ctx: &StageContext, options: &StageOptions) -> anyhow::Result<()>;
}
