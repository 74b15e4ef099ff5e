//! Rollback outcome and preview value objects.

use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate outcome of one rollback invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackResult {
    /// True iff every constituent single-stage rollback succeeded.
    pub success: bool,
    /// The originally requested stage.
    pub stage: String,
    /// Human-readable summary.
    pub message: String,
    /// Files deleted, summed across constituent stages.
    pub deleted_files: usize,
    /// Stage names successfully rolled back, in execution order.
    pub deleted_resources: Vec<String>,
    /// `"{stage}: {message}"` entries for failed constituents.
    pub errors: Vec<String>,
}

impl RollbackResult {
    /// Creates a failed result with no deletions, for validation errors.
    #[must_use]
    pub fn rejected(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            stage: stage.into(),
            message: message.into(),
            deleted_files: 0,
            deleted_resources: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// What a rollback would delete, without deleting anything.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackPreview {
    /// The stages that would be rolled back, earliest first.
    pub stages: Vec<String>,
    /// File counts per local artifact category, for non-empty categories.
    pub files: BTreeMap<String, usize>,
    /// External resource identifiers that would be deleted.
    pub external_resources: Vec<String>,
    /// Warnings for high-impact stages.
    pub warnings: Vec<String>,
}
