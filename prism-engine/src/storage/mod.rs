//! Project-scoped blob storage.
//!
//! All persisted state lives under a per-project namespace:
//!
//! ```text
//! {project}/
//!     documents/                      # raw uploads
//!     output/
//!         extraction_results/
//!         chunked_documents/
//!         embedded_documents/
//!         indexing_reports/
//!         results.json
//!     config.json
//!     workflow_config.json
//! ```
//!
//! Storage errors are benign by design: deleting an absent file is a no-op,
//! and unreadable or undecodable data reads as absent. Callers must treat
//! "no data" as a normal outcome, not a failure.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use crate::project::ProjectConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File name (final path segment).
    pub name: String,
    /// Path relative to the project namespace.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when known.
    pub modified: Option<DateTime<Utc>>,
}

/// Key/value blob store scoped by project name and relative path.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Returns true if the file exists.
    async fn file_exists(&self, project: &str, path: &str) -> bool;

    /// Reads a file's bytes; `None` if absent or unreadable.
    async fn read_file(&self, project: &str, path: &str) -> Option<Vec<u8>>;

    /// Writes a file, creating or overwriting. Returns success.
    async fn write_file(&self, project: &str, path: &str, content: &[u8]) -> bool;

    /// Deletes a file. Returns true if a file was deleted; deleting an
    /// absent file returns false and is not an error.
    async fn delete_file(&self, project: &str, path: &str) -> bool;

    /// Lists files under a prefix, sorted by name. Dot-files and
    /// `.placeholder` markers are skipped. With `recursive` false, entries
    /// in subdirectories of the prefix are excluded.
    async fn list_files(&self, project: &str, prefix: &str, recursive: bool) -> Vec<FileInfo>;

    /// Lists all project names, sorted.
    async fn list_projects(&self) -> Vec<String>;

    /// Returns true if the project exists (its config file is present).
    async fn project_exists(&self, project: &str) -> bool {
        self.file_exists(project, "config.json").await
    }

    /// Creates a project with an initial config and empty workflow config.
    async fn create_project(&self, project: &str) -> bool {
        let config = match serde_json::to_value(ProjectConfig::new(project)) {
            Ok(value) => value,
            Err(_) => return false,
        };
        let workflow = serde_json::json!({ "sections": [] });
        self.write_json(project, "config.json", &config).await
            && self
                .write_json(project, "workflow_config.json", &workflow)
                .await
    }

    /// Deletes a project and every file under its namespace, including
    /// entries hidden from listings. The default removes listed files only;
    /// backends that can hold dot-files or `.placeholder` markers must
    /// override it.
    async fn delete_project(&self, project: &str) -> bool {
        for file in self.list_files(project, "", true).await {
            self.delete_file(project, &file.path).await;
        }
        true
    }

    /// Reads and decodes a JSON file; `None` if absent or malformed.
    async fn read_json(&self, project: &str, path: &str) -> Option<serde_json::Value> {
        let bytes = self.read_file(project, path).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(project, path, %err, "invalid JSON in storage");
                None
            }
        }
    }

    /// Serializes and writes a JSON file. Returns success.
    async fn write_json(&self, project: &str, path: &str, value: &serde_json::Value) -> bool {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.write_file(project, path, &bytes).await,
            Err(_) => false,
        }
    }
}

/// Returns true if a path segment should be hidden from listings.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.ends_with(".placeholder")
}
