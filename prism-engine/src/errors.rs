//! Error types for the Prism engine.
//!
//! Validation failures (unknown project, stage, or section) are detected
//! before any mutation and surfaced synchronously. Execution failures inside
//! a running stage or section are never raised to the caller that triggered
//! the run; they are recorded on the task record instead.

use thiserror::Error;
use uuid::Uuid;

/// Valid rollback stage names, in pipeline order.
pub const VALID_ROLLBACK_STAGES: &str =
    "extraction, chunking, embedding, index, source, agent";

/// Valid pipeline stage names, in pipeline order.
pub const VALID_PIPELINE_STAGES: &str = "process, deduplicate, chunk, embed, \
     index_create, index_upload, source_create, agent_create";

/// The main error type for engine operations.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A stage name outside the known vocabulary was requested.
    #[error("Invalid stage '{stage}'. Valid stages: {valid}")]
    InvalidStage {
        /// The stage name as requested.
        stage: String,
        /// The accepted stage names for this operation.
        valid: &'static str,
    },

    /// The named project does not exist in storage.
    #[error("Project '{project}' not found")]
    ProjectNotFound {
        /// The project name as requested.
        project: String,
    },

    /// The named workflow section does not exist in the project's config.
    #[error("Section not found: {section}")]
    SectionNotFound {
        /// The section identifier.
        section: String,
        /// The project that was searched.
        project: String,
    },

    /// No task record exists for the given identifier.
    #[error("Task not found: {id}")]
    TaskNotFound {
        /// The task identifier.
        id: Uuid,
    },

    /// The storage gateway failed in a way that cannot be treated as absence.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Creates an invalid-stage error for the rollback vocabulary.
    #[must_use]
    pub fn invalid_rollback_stage(stage: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.into(),
            valid: VALID_ROLLBACK_STAGES,
        }
    }

    /// Creates an invalid-stage error for the pipeline vocabulary.
    #[must_use]
    pub fn invalid_pipeline_stage(stage: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.into(),
            valid: VALID_PIPELINE_STAGES,
        }
    }

    /// Creates a project-not-found error.
    #[must_use]
    pub fn project_not_found(project: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project: project.into(),
        }
    }

    /// Creates a section-not-found error.
    #[must_use]
    pub fn section_not_found(section: impl Into<String>, project: impl Into<String>) -> Self {
        Self::SectionNotFound {
            section: section.into(),
            project: project.into(),
        }
    }
}

/// Error reported by an external search-resource deletion collaborator.
///
/// Deleting an already-absent resource is success by contract, so this error
/// only surfaces genuine failures (auth, transport, service-side rejection).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResourceError {
    /// Human-readable failure description.
    pub message: String,
}

impl ResourceError {
    /// Creates a new resource error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
