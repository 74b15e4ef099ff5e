//! Project configuration stored at `{project}/config.json`.
//!
//! The status block carries the flags the rollback engine clears when it
//! deletes external resources. Unknown keys are preserved across rewrites so
//! the engine can coexist with other writers of the config file.

use crate::storage::StorageGateway;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline-derived status flags for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    /// True once documents have been uploaded to the search index.
    #[serde(default)]
    pub is_indexed: bool,
    /// True once a knowledge agent exists for the project.
    #[serde(default)]
    pub has_agent: bool,
    /// Name of the knowledge agent, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Flags written by other components, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (matches the storage namespace).
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Pipeline status flags.
    #[serde(default)]
    pub status: ProjectStatus,
    /// Fields written by other components, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProjectConfig {
    /// Creates the initial config for a new project.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            status: ProjectStatus::default(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Loads a project's config; `None` if absent or malformed.
pub async fn load_config(storage: &dyn StorageGateway, project: &str) -> Option<ProjectConfig> {
    let value = storage.read_json(project, "config.json").await?;
    serde_json::from_value(value).ok()
}

/// Saves a project's config. Returns success.
pub async fn save_config(
    storage: &dyn StorageGateway,
    project: &str,
    config: &ProjectConfig,
) -> bool {
    match serde_json::to_value(config) {
        Ok(value) => storage.write_json(project, "config.json", &value).await,
        Err(_) => false,
    }
}

/// Applies an update to a project's status flags and persists the config.
/// Returns false when the config is absent or the write fails.
pub async fn update_status(
    storage: &dyn StorageGateway,
    project: &str,
    f: impl FnOnce(&mut ProjectStatus) + Send,
) -> bool {
    let Some(mut config) = load_config(storage, project).await else {
        return false;
    };
    f(&mut config.status);
    save_config(storage, project, &config).await
}
