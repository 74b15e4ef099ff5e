//! Stage identities, the cascade graph, and the executor seam.
//!
//! This module contains:
//! - The forward pipeline stage vocabulary and its catalog
//! - The rollback stage total order and derived cascade graph
//! - The `StageExecutor` trait that external stage implementations fulfil

mod executor;
mod registry;

pub use executor::{StageContext, StageExecutor, StageOptions};
pub use registry::{pipeline_stage_catalog, PipelineStage, RollbackStage, StageInfo};
