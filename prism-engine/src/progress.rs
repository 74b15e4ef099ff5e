//! Per-run progress reporting.
//!
//! Stage implementations report fine-grained progress without a direct
//! reference to the task tracker. The reporter is constructed by the runner
//! for exactly one task and handed to the executor inside its context, so
//! concurrent stage runs cannot leak progress into each other's tasks.
//!
//! Supports nested progress: a document-level frame composed into
//! page-level messages.

use crate::tasks::TaskTracker;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// The document frame for nested page progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    /// Current document number (1-indexed).
    pub current: u64,
    /// Total number of documents.
    pub total: u64,
    /// Name of the current document.
    pub name: String,
}

/// Progress sink bound to a single task.
pub struct ProgressReporter {
    tracker: Arc<TaskTracker>,
    task_id: Uuid,
    doc_context: Mutex<Option<DocumentContext>>,
}

impl ProgressReporter {
    /// Creates a reporter bound to one task.
    #[must_use]
    pub fn new(tracker: Arc<TaskTracker>, task_id: Uuid) -> Self {
        Self {
            tracker,
            task_id,
            doc_context: Mutex::new(None),
        }
    }

    /// Returns the task this reporter is bound to.
    #[must_use]
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Reports progress for the task.
    pub fn report(&self, current: u64, total: u64, message: impl Into<String>) {
        self.tracker
            .update_progress(self.task_id, current, total, message);
    }

    /// Sets the document frame used to compose page-level messages.
    pub fn set_document_context(&self, current: u64, total: u64, name: impl Into<String>) {
        *self.doc_context.lock() = Some(DocumentContext {
            current,
            total,
            name: name.into(),
        });
    }

    /// Clears the document frame.
    pub fn clear_document_context(&self) {
        *self.doc_context.lock() = None;
    }

    /// Reports page-level progress within the current document.
    ///
    /// The document frame, when set, is prefixed onto the message; the page
    /// position drives the progress bar either way.
    pub fn report_page(&self, page: u64, total_pages: u64, page_message: &str) {
        let doc = self.doc_context.lock().clone();
        let mut message = match doc {
            Some(ctx) if ctx.total > 0 => {
                if ctx.name.is_empty() {
                    format!(
                        "Doc {}/{} - Page {}/{}",
                        ctx.current, ctx.total, page, total_pages
                    )
                } else {
                    format!(
                        "{} ({}/{}) - Page {}/{}",
                        ctx.name, ctx.current, ctx.total, page, total_pages
                    )
                }
            }
            _ => format!("Page {page}/{total_pages}"),
        };
        if !page_message.is_empty() {
            message.push_str(" - ");
            message.push_str(page_message);
        }
        self.report(page, total_pages, message);
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("task_id", &self.task_id)
            .finish()
    }
}
