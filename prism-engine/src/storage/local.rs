//! Filesystem-backed storage gateway.

use super::{is_hidden, FileInfo, StorageGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Returns true if a relative path contains a parent-directory segment.
fn escapes(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// Storage gateway rooted at a local directory.
///
/// Each project is a subdirectory of the base path; relative paths map
/// directly onto the filesystem.
pub struct LocalStorage {
    base: PathBuf,
}

impl LocalStorage {
    /// Creates a gateway rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.base.join(project)
    }

    /// `None` when any segment would escape the project directory. Escaping
    /// paths behave like absent files, matching the gateway's benign-error
    /// contract.
    fn resolve(&self, project: &str, path: &str) -> Option<PathBuf> {
        if escapes(project) || escapes(path) {
            return None;
        }
        Some(self.project_dir(project).join(path))
    }

    async fn file_info(path: &Path, relative: String) -> Option<FileInfo> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        if is_hidden(&name) {
            return None;
        }
        let meta = fs::metadata(path).await.ok()?;
        let modified = meta
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        Some(FileInfo {
            name,
            path: relative,
            size: meta.len(),
            modified,
        })
    }
}

#[async_trait]
impl StorageGateway for LocalStorage {
    async fn file_exists(&self, project: &str, path: &str) -> bool {
        match self.resolve(project, path) {
            Some(target) => fs::try_exists(target).await.unwrap_or(false),
            None => false,
        }
    }

    async fn read_file(&self, project: &str, path: &str) -> Option<Vec<u8>> {
        fs::read(self.resolve(project, path)?).await.ok()
    }

    async fn write_file(&self, project: &str, path: &str, content: &[u8]) -> bool {
        let Some(target) = self.resolve(project, path) else {
            return false;
        };
        if let Some(parent) = target.parent() {
            if fs::create_dir_all(parent).await.is_err() {
                return false;
            }
        }
        match fs::write(&target, content).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(project, path, %err, "failed to write file");
                false
            }
        }
    }

    async fn delete_file(&self, project: &str, path: &str) -> bool {
        match self.resolve(project, path) {
            Some(target) => fs::remove_file(target).await.is_ok(),
            None => false,
        }
    }

    async fn list_files(&self, project: &str, prefix: &str, recursive: bool) -> Vec<FileInfo> {
        if escapes(project) || escapes(prefix) {
            return Vec::new();
        }
        let project_dir = self.project_dir(project);
        let root = if prefix.is_empty() {
            project_dir.clone()
        } else {
            project_dir.join(prefix.trim_end_matches('/'))
        };

        let mut files = Vec::new();
        let mut stack = vec![root];
        while let Some(dir) = stack.pop() {
            let Ok(mut entries) = fs::read_dir(&dir).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                if file_type.is_dir() {
                    if recursive {
                        stack.push(path);
                    }
                    continue;
                }
                let relative = path
                    .strip_prefix(&project_dir)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                if let Some(info) = Self::file_info(&path, relative).await {
                    files.push(info);
                }
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    async fn delete_project(&self, project: &str) -> bool {
        if escapes(project) {
            return false;
        }
        match fs::remove_dir_all(self.project_dir(project)).await {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(err) => {
                tracing::error!(project, %err, "failed to delete project");
                false
            }
        }
    }

    async fn list_projects(&self) -> Vec<String> {
        let mut projects = Vec::new();
        let Ok(mut entries) = fs::read_dir(&self.base).await else {
            return projects;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                projects.push(name);
            }
        }
        projects.sort();
        projects
    }
}
