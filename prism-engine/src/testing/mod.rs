//! Testing utilities for the engine.
//!
//! This module provides:
//! - Mock stage executors and a mock search-resource client
//! - A scripted section workflow that records answers like a real one
//! - Fixture helpers for pre-populated project storage

mod fixtures;
mod mocks;

pub use fixtures::populate_pipeline_output;
pub use mocks::{
    ExecutorCall, FailingStageExecutor, MockSearchResourceClient, MockStageExecutor,
    ScriptedSectionWorkflow,
};
