//! In-memory storage gateway.

use super::{is_hidden, FileInfo, StorageGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

struct Entry {
    content: Vec<u8>,
    modified: DateTime<Utc>,
}

/// Storage gateway backed by an in-process map.
///
/// The primary test double, and a usable backend for ephemeral deployments.
/// Keys are `{project}/{relative_path}`.
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(project: &str, path: &str) -> String {
        format!("{project}/{path}")
    }

    /// Returns the number of stored files across all projects.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

#[async_trait]
impl StorageGateway for MemoryStorage {
    async fn file_exists(&self, project: &str, path: &str) -> bool {
        self.files.read().contains_key(&Self::key(project, path))
    }

    async fn read_file(&self, project: &str, path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(&Self::key(project, path))
            .map(|entry| entry.content.clone())
    }

    async fn write_file(&self, project: &str, path: &str, content: &[u8]) -> bool {
        self.files.write().insert(
            Self::key(project, path),
            Entry {
                content: content.to_vec(),
                modified: Utc::now(),
            },
        );
        true
    }

    async fn delete_file(&self, project: &str, path: &str) -> bool {
        self.files
            .write()
            .remove(&Self::key(project, path))
            .is_some()
    }

    async fn list_files(&self, project: &str, prefix: &str, recursive: bool) -> Vec<FileInfo> {
        let scope = if prefix.is_empty() {
            format!("{project}/")
        } else {
            format!("{project}/{}/", prefix.trim_end_matches('/'))
        };
        let project_scope = format!("{project}/");

        let mut files: Vec<FileInfo> = self
            .files
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(&scope))
            .filter_map(|(key, entry)| {
                let relative = &key[project_scope.len()..];
                let within_prefix = &key[scope.len()..];
                if !recursive && within_prefix.contains('/') {
                    return None;
                }
                let name = within_prefix.rsplit('/').next().unwrap_or(within_prefix);
                if is_hidden(name) {
                    return None;
                }
                Some(FileInfo {
                    name: name.to_string(),
                    path: relative.to_string(),
                    size: entry.content.len() as u64,
                    modified: Some(entry.modified),
                })
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    async fn delete_project(&self, project: &str) -> bool {
        // Unfiltered by design: hidden entries must not survive deletion.
        let prefix = format!("{project}/");
        self.files.write().retain(|key, _| !key.starts_with(&prefix));
        true
    }

    async fn list_projects(&self) -> Vec<String> {
        let mut projects: Vec<String> = self
            .files
            .read()
            .keys()
            .filter_map(|key| key.split('/').next())
            .filter(|name| !name.is_empty() && !name.starts_with('.'))
            .map(String::from)
            .collect();
        projects.sort();
        projects.dedup();
        projects
    }
}
