//! External search-resource deletion collaborators.

use crate::errors::ResourceError;
use async_trait::async_trait;

/// Deletes the search resources backing a project's retrieval stack.
///
/// Implementations wrap the hosted search service's management API. Each
/// deletion must treat an already-absent resource as success; only genuine
/// failures (auth, transport, service-side rejection) are errors.
#[async_trait]
pub trait SearchResourceClient: Send + Sync {
    /// Deletes the project's search index.
    async fn delete_index(&self, project: &str) -> Result<(), ResourceError>;

    /// Deletes the project's knowledge source.
    async fn delete_knowledge_source(&self, project: &str) -> Result<(), ResourceError>;

    /// Deletes the project's knowledge agent.
    async fn delete_knowledge_agent(&self, project: &str) -> Result<(), ResourceError>;
}

/// Returns the name of a project's search index.
#[must_use]
pub fn index_resource_name(project: &str) -> String {
    format!("prism-{project}-index")
}

/// Returns the name of a project's knowledge source.
#[must_use]
pub fn source_resource_name(project: &str) -> String {
    format!("prism-{project}-index-source")
}

/// Returns the name of a project's knowledge agent.
#[must_use]
pub fn agent_resource_name(project: &str) -> String {
    format!("prism-{project}-index-agent")
}
