//! # Prism Engine
//!
//! Stage orchestration and task tracking for the Prism document pipeline.
//!
//! The engine coordinates a multi-stage ingestion workflow (extract, chunk,
//! embed, index, create search resources) and the question-answering
//! workflows that run against the indexed corpus, with support for:
//!
//! - **Fire-and-forget stage execution**: each triggered stage runs on its
//!   own task, tracked independently of the caller
//! - **Task tracking**: thread-safe registry of task records with progress
//! - **Per-run progress reporting**: executors report document/page progress
//!   through a reporter scoped to their own task
//! - **Cascading rollback**: tearing down an early stage also tears down
//!   every stage built on top of it, deepest first
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prism_engine::prelude::*;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let runner = PipelineRunner::new(storage.clone())
//!     .with_executor(PipelineStage::Chunk, Arc::new(ChunkExecutor::new()));
//!
//! // Trigger a stage; the returned task is pending, execution is spawned.
//! let task = runner.run_stage("demo", PipelineStage::Chunk, StageOptions::default());
//!
//! // Poll for completion.
//! let status = runner.task(task.id);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod errors;
pub mod observability;
pub mod progress;
pub mod project;
pub mod rollback;
pub mod runner;
pub mod stages;
pub mod storage;
pub mod tasks;
pub mod testing;
pub mod workflow;

#[cfg(test)]
mod engine_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::{EngineError, ResourceError};
    pub use crate::progress::{DocumentContext, ProgressReporter};
    pub use crate::project::{ProjectConfig, ProjectStatus};
    pub use crate::rollback::{
        RollbackEngine, RollbackPreview, RollbackResult, SearchResourceClient,
    };
    pub use crate::runner::PipelineRunner;
    pub use crate::stages::{
        PipelineStage, RollbackStage, StageContext, StageExecutor, StageInfo,
        StageOptions,
    };
    pub use crate::storage::{FileInfo, MemoryStorage, StorageGateway};
    pub use crate::tasks::{Task, TaskProgress, TaskStatus, TaskTracker};
    pub use crate::workflow::{
        Question, Section, SectionRunner, SectionWorkflow, WorkflowConfig,
        WorkflowStore, WorkflowTask,
    };
}
