//! Stage enums and the rollback dependency order.
//!
//! The rollback vocabulary has a single source of truth: the total order in
//! [`RollbackStage::ORDER`]. The cascade set of a stage is derived from it as
//! "everything strictly after", which keeps the cascade graph and the
//! roll-back-to derivation from ever drifting apart when stages are added.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stage of the forward ingestion pipeline.
///
/// Ordering is significant, but the engine does not auto-chain stages; each
/// is triggered independently by a caller, optionally in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Extract text from uploaded documents.
    Process,
    /// Analyze and remove duplicate content.
    Deduplicate,
    /// Split documents into semantic chunks.
    Chunk,
    /// Generate vector embeddings for chunks.
    Embed,
    /// Create the search index.
    IndexCreate,
    /// Upload embedded documents to the search index.
    IndexUpload,
    /// Create the knowledge source wrapping the index.
    SourceCreate,
    /// Create the knowledge agent for agentic retrieval.
    AgentCreate,
}

impl PipelineStage {
    /// All pipeline stages, in execution order.
    pub const ALL: [Self; 8] = [
        Self::Process,
        Self::Deduplicate,
        Self::Chunk,
        Self::Embed,
        Self::IndexCreate,
        Self::IndexUpload,
        Self::SourceCreate,
        Self::AgentCreate,
    ];

    /// Returns the wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Deduplicate => "deduplicate",
            Self::Chunk => "chunk",
            Self::Embed => "embed",
            Self::IndexCreate => "index_create",
            Self::IndexUpload => "index_upload",
            Self::SourceCreate => "source_create",
            Self::AgentCreate => "agent_create",
        }
    }

    /// Returns a human-readable label for the stage.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Process => "Extract Documents",
            Self::Deduplicate => "Deduplicate",
            Self::Chunk => "Chunk Documents",
            Self::Embed => "Generate Embeddings",
            Self::IndexCreate => "Create Index",
            Self::IndexUpload => "Upload to Index",
            Self::SourceCreate => "Create Knowledge Source",
            Self::AgentCreate => "Create Knowledge Agent",
        }
    }

    /// Returns a one-line description of what the stage does.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Process => "Process documents and extract content to markdown",
            Self::Deduplicate => "Analyze and remove duplicate content",
            Self::Chunk => "Split documents into semantic chunks for RAG",
            Self::Embed => "Create vector embeddings for chunks",
            Self::IndexCreate => "Create the search index",
            Self::IndexUpload => "Upload embedded documents to search index",
            Self::SourceCreate => "Create knowledge source wrapper for index",
            Self::AgentCreate => "Create knowledge agent for agentic retrieval",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| EngineError::invalid_pipeline_stage(s))
    }
}

/// Catalog entry describing one pipeline stage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageInfo {
    /// Wire name of the stage.
    pub id: &'static str,
    /// Human-readable label.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Returns the catalog of all pipeline stages, in execution order.
#[must_use]
pub fn pipeline_stage_catalog() -> Vec<StageInfo> {
    PipelineStage::ALL
        .into_iter()
        .map(|stage| StageInfo {
            id: stage.as_str(),
            name: stage.label(),
            description: stage.description(),
        })
        .collect()
}

/// A rollback target, mapped onto the pipeline stages' output artifacts.
///
/// Rolling back a stage with cascade also rolls back every stage strictly
/// after it in [`RollbackStage::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStage {
    /// Extraction output (markdown, inventories, reports).
    Extraction,
    /// Chunked documents.
    Chunking,
    /// Embedded documents and indexing reports.
    Embedding,
    /// The external search index.
    Index,
    /// The external knowledge source.
    Source,
    /// The external knowledge agent.
    Agent,
}

impl RollbackStage {
    /// All rollback stages, in dependency order (earliest first).
    pub const ORDER: [Self; 6] = [
        Self::Extraction,
        Self::Chunking,
        Self::Embedding,
        Self::Index,
        Self::Source,
        Self::Agent,
    ];

    /// Returns the wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Index => "index",
            Self::Source => "source",
            Self::Agent => "agent",
        }
    }

    /// Returns the position of the stage in the total order.
    #[must_use]
    pub fn position(self) -> usize {
        match self {
            Self::Extraction => 0,
            Self::Chunking => 1,
            Self::Embedding => 2,
            Self::Index => 3,
            Self::Source => 4,
            Self::Agent => 5,
        }
    }

    /// Returns the stages that must also be rolled back when this stage is
    /// rolled back with cascade: everything strictly after it in the order.
    #[must_use]
    pub fn cascade_of(self) -> &'static [Self] {
        &Self::ORDER[self.position() + 1..]
    }

    /// Returns the stages to delete when rolling back *to* this stage,
    /// keeping this stage and everything before it intact.
    ///
    /// Identical to [`Self::cascade_of`]; the alias exists so roll-back-to
    /// call sites read as their own operation while the two sets can never
    /// disagree.
    #[must_use]
    pub fn stages_after(self) -> &'static [Self] {
        self.cascade_of()
    }
}

impl fmt::Display for RollbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollbackStage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| EngineError::invalid_rollback_stage(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pipeline_stage_roundtrip() {
        for stage in PipelineStage::ALL {
            let parsed: PipelineStage = stage.as_str().parse().unwrap();
            assert_eq!(parsed, stage);
        }
    }

    #[test]
    fn test_pipeline_stage_serde_names() {
        let json = serde_json::to_string(&PipelineStage::IndexCreate).unwrap();
        assert_eq!(json, r#""index_create""#);
    }

    #[test]
    fn test_unknown_pipeline_stage_fails() {
        assert!("extract".parse::<PipelineStage>().is_err());
    }

    #[test]
    fn test_catalog_covers_all_stages() {
        let catalog = pipeline_stage_catalog();
        assert_eq!(catalog.len(), PipelineStage::ALL.len());
        assert_eq!(catalog[0].id, "process");
        assert_eq!(catalog[7].id, "agent_create");
    }

    #[test]
    fn test_cascade_is_suffix_of_order() {
        for (i, stage) in RollbackStage::ORDER.into_iter().enumerate() {
            assert_eq!(stage.cascade_of(), &RollbackStage::ORDER[i + 1..]);
            assert!(!stage.cascade_of().contains(&stage));
        }
    }

    #[test]
    fn test_agent_cascade_is_empty() {
        assert!(RollbackStage::Agent.cascade_of().is_empty());
    }

    #[test]
    fn test_extraction_cascades_to_everything_later() {
        let cascade = RollbackStage::Extraction.cascade_of();
        assert_eq!(
            cascade,
            &[
                RollbackStage::Chunking,
                RollbackStage::Embedding,
                RollbackStage::Index,
                RollbackStage::Source,
                RollbackStage::Agent,
            ]
        );
    }

    #[test]
    fn test_stages_after_agrees_with_cascade() {
        for stage in RollbackStage::ORDER {
            assert_eq!(stage.stages_after(), stage.cascade_of());
        }
    }

    #[test]
    fn test_rollback_stage_parse_error_lists_valid_names() {
        let err = "chunk".parse::<RollbackStage>().unwrap_err();
        assert!(err.to_string().contains("chunking"));
    }
}
