//! The rollback engine.

use super::resources::{
    agent_resource_name, index_resource_name, source_resource_name, SearchResourceClient,
};
use super::result::{RollbackPreview, RollbackResult};
use crate::errors::EngineError;
use crate::project;
use crate::stages::RollbackStage;
use crate::storage::StorageGateway;
use std::collections::BTreeMap;
use std::sync::Arc;

const EXTRACTION_DIR: &str = "output/extraction_results";
const CHUNKED_DIR: &str = "output/chunked_documents";
const EMBEDDED_DIR: &str = "output/embedded_documents";
const INDEXING_REPORTS_DIR: &str = "output/indexing_reports";

/// Single files removed alongside the extraction tree. Includes the
/// accumulated workflow answers, which are derived from extracted content.
const EXTRACTION_AUX_FILES: [&str; 5] = [
    "output/extraction_status.json",
    "output/document_inventory.json",
    "output/deduplication_report.md",
    "output/extraction_analysis.json",
    "output/results.json",
];

const EMBEDDING_AUX_FILES: [&str; 3] = [
    "output/embedding_report.md",
    "output/index_verification.md",
    "output/upload_report.json",
];

const INDEX_WARNING: &str = "Deleting the index will remove all searchable content. \
     You will need to re-embed and re-upload to restore search functionality.";
const EXTRACTION_WARNING: &str =
    "Deleting extraction results will require re-processing all documents.";

/// Outcome of one single-stage teardown.
struct StageOutcome {
    success: bool,
    message: String,
    deleted_files: usize,
}

impl StageOutcome {
    fn files(deleted_files: usize) -> Self {
        Self {
            success: true,
            message: format!("Deleted {deleted_files} files"),
            deleted_files,
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            deleted_files: 0,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            deleted_files: 0,
        }
    }
}

/// Tears down stage artifacts and external resources, with cascade.
pub struct RollbackEngine {
    storage: Arc<dyn StorageGateway>,
    search: Arc<dyn SearchResourceClient>,
}

impl RollbackEngine {
    /// Creates an engine over a storage gateway and search-resource client.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>, search: Arc<dyn SearchResourceClient>) -> Self {
        Self { storage, search }
    }

    /// Rolls back a stage, optionally cascading to every later stage.
    ///
    /// Stage and project are validated before any deletion; validation
    /// failures come back as an unsuccessful result with no deletions.
    pub async fn rollback(&self, project: &str, stage: &str, cascade: bool) -> RollbackResult {
        let parsed: RollbackStage = match stage.parse() {
            Ok(parsed) => parsed,
            Err(err) => return RollbackResult::rejected(stage, err.to_string()),
        };
        if !self.storage.project_exists(project).await {
            return RollbackResult::rejected(
                stage,
                EngineError::project_not_found(project).to_string(),
            );
        }
        self.rollback_validated(project, parsed, cascade).await
    }

    /// Rolls back everything after `target`, keeping `target` and all
    /// earlier stages intact. Rolling back to the last stage is a no-op
    /// success.
    pub async fn rollback_to(&self, project: &str, target: &str) -> RollbackResult {
        let parsed: RollbackStage = match target.parse() {
            Ok(parsed) => parsed,
            Err(err) => return RollbackResult::rejected(target, err.to_string()),
        };
        if !self.storage.project_exists(project).await {
            return RollbackResult::rejected(
                target,
                EngineError::project_not_found(project).to_string(),
            );
        }

        let Some(first) = parsed.stages_after().first() else {
            return RollbackResult {
                success: true,
                stage: parsed.as_str().to_string(),
                message: format!("Already at stage '{parsed}', nothing to roll back"),
                deleted_files: 0,
                deleted_resources: Vec::new(),
                errors: Vec::new(),
            };
        };

        // The cascade from the first stage past the target reaches exactly
        // the remaining stages because the cascade is derived from the same
        // total order.
        let mut result = self.rollback_validated(project, *first, true).await;
        result.stage = parsed.as_str().to_string();
        if result.success {
            result.message = format!("Rolled back to '{parsed}'");
        }
        result
    }

    /// Clears all pipeline output and external resources for a project.
    /// Source documents under `documents/` are untouched.
    pub async fn clear_all(&self, project: &str) -> RollbackResult {
        let mut result = self
            .rollback(project, RollbackStage::Extraction.as_str(), true)
            .await;
        if result.success {
            result.message = "All output cleared".to_string();
        }
        result
    }

    async fn rollback_validated(
        &self,
        project: &str,
        stage: RollbackStage,
        cascade: bool,
    ) -> RollbackResult {
        // The cascade set is a suffix of the total order, so the combined
        // list is already duplicate-free and ordered.
        let mut stages = vec![stage];
        if cascade {
            stages.extend_from_slice(stage.cascade_of());
        }

        let mut deleted_files = 0;
        let mut deleted_resources = Vec::new();
        let mut errors = Vec::new();

        // Deepest dependent first: agent before source before index before
        // the local artifact stages.
        for s in stages.iter().rev() {
            let outcome = self.rollback_single(project, *s).await;
            if outcome.success {
                deleted_files += outcome.deleted_files;
                deleted_resources.push(s.as_str().to_string());
            } else {
                errors.push(format!("{s}: {}", outcome.message));
            }
        }

        let success = errors.is_empty();
        tracing::info!(
            project,
            %stage,
            cascade,
            deleted_files,
            success,
            "rollback finished"
        );
        RollbackResult {
            success,
            stage: stage.as_str().to_string(),
            message: if success {
                format!("Rolled back {} stage(s)", deleted_resources.len())
            } else {
                "Rollback completed with errors".to_string()
            },
            deleted_files,
            deleted_resources,
            errors,
        }
    }

    async fn rollback_single(&self, project: &str, stage: RollbackStage) -> StageOutcome {
        match stage {
            RollbackStage::Extraction => self.rollback_extraction(project).await,
            RollbackStage::Chunking => {
                StageOutcome::files(self.delete_tree(project, CHUNKED_DIR).await)
            }
            RollbackStage::Embedding => self.rollback_embedding(project).await,
            RollbackStage::Index => self.rollback_index(project).await,
            RollbackStage::Source => self.rollback_source(project).await,
            RollbackStage::Agent => self.rollback_agent(project).await,
        }
    }

    /// Deletes every file under a project-relative directory prefix.
    async fn delete_tree(&self, project: &str, prefix: &str) -> usize {
        let mut deleted = 0;
        for file in self.storage.list_files(project, prefix, true).await {
            if self.storage.delete_file(project, &file.path).await {
                deleted += 1;
            }
        }
        deleted
    }

    async fn delete_aux_files(&self, project: &str, paths: &[&str]) -> usize {
        let mut deleted = 0;
        for path in paths {
            if self.storage.delete_file(project, path).await {
                deleted += 1;
            }
        }
        deleted
    }

    // Local-file stages always succeed: deleting already-absent files is a
    // no-op, not an error.

    async fn rollback_extraction(&self, project: &str) -> StageOutcome {
        let mut deleted = self.delete_tree(project, EXTRACTION_DIR).await;
        deleted += self.delete_aux_files(project, &EXTRACTION_AUX_FILES).await;
        StageOutcome::files(deleted)
    }

    async fn rollback_embedding(&self, project: &str) -> StageOutcome {
        let mut deleted = self.delete_tree(project, EMBEDDED_DIR).await;
        deleted += self.delete_tree(project, INDEXING_REPORTS_DIR).await;
        deleted += self.delete_aux_files(project, &EMBEDDING_AUX_FILES).await;
        StageOutcome::files(deleted)
    }

    async fn rollback_index(&self, project: &str) -> StageOutcome {
        match self.search.delete_index(project).await {
            Ok(()) => {
                project::update_status(self.storage.as_ref(), project, |status| {
                    status.is_indexed = false;
                })
                .await;
                StageOutcome::ok("Search index deleted")
            }
            Err(err) => StageOutcome::failed(err.to_string()),
        }
    }

    async fn rollback_source(&self, project: &str) -> StageOutcome {
        match self.search.delete_knowledge_source(project).await {
            Ok(()) => StageOutcome::ok("Knowledge source deleted"),
            Err(err) => StageOutcome::failed(err.to_string()),
        }
    }

    async fn rollback_agent(&self, project: &str) -> StageOutcome {
        match self.search.delete_knowledge_agent(project).await {
            Ok(()) => {
                project::update_status(self.storage.as_ref(), project, |status| {
                    status.has_agent = false;
                    status.agent_name = None;
                })
                .await;
                StageOutcome::ok("Knowledge agent deleted")
            }
            Err(err) => StageOutcome::failed(err.to_string()),
        }
    }

    /// Previews a rollback without deleting anything.
    pub async fn preview(
        &self,
        project: &str,
        stage: &str,
        cascade: bool,
    ) -> Result<RollbackPreview, EngineError> {
        let parsed: RollbackStage = stage.parse()?;
        if !self.storage.project_exists(project).await {
            return Err(EngineError::project_not_found(project));
        }

        let mut stages = vec![parsed];
        if cascade {
            stages.extend_from_slice(parsed.cascade_of());
        }

        let mut files = BTreeMap::new();
        let mut external_resources = Vec::new();
        for s in &stages {
            match s {
                RollbackStage::Extraction => {
                    let count = self.storage.list_files(project, EXTRACTION_DIR, true).await.len();
                    if count > 0 {
                        files.insert("extraction_results".to_string(), count);
                    }
                }
                RollbackStage::Chunking => {
                    let count = self.storage.list_files(project, CHUNKED_DIR, true).await.len();
                    if count > 0 {
                        files.insert("chunked_documents".to_string(), count);
                    }
                }
                RollbackStage::Embedding => {
                    let count = self.storage.list_files(project, EMBEDDED_DIR, true).await.len();
                    if count > 0 {
                        files.insert("embedded_documents".to_string(), count);
                    }
                }
                RollbackStage::Index => external_resources.push(index_resource_name(project)),
                RollbackStage::Source => external_resources.push(source_resource_name(project)),
                RollbackStage::Agent => external_resources.push(agent_resource_name(project)),
            }
        }

        let mut warnings = Vec::new();
        if stages.contains(&RollbackStage::Index) {
            warnings.push(INDEX_WARNING.to_string());
        }
        if stages.contains(&RollbackStage::Extraction) {
            warnings.push(EXTRACTION_WARNING.to_string());
        }

        Ok(RollbackPreview {
            stages: stages.iter().map(|s| s.as_str().to_string()).collect(),
            files,
            external_resources,
            warnings,
        })
    }
}
