//! Rollback of pipeline stages with cascade semantics.
//!
//! Rolling back a stage deletes its output artifacts (and, for the index /
//! source / agent stages, the corresponding external resources). With
//! cascade enabled, every stage after it is deleted too, deepest dependent
//! first, so a downstream resource never outlives the upstream data it
//! references. Teardown is best-effort: a failing stage does not stop the
//! remaining ones, and failures are itemized in the aggregate result.

mod engine;
mod resources;
mod result;

pub use engine::RollbackEngine;
pub use resources::{
    agent_resource_name, index_resource_name, source_resource_name, SearchResourceClient,
};
pub use result::{RollbackPreview, RollbackResult};
