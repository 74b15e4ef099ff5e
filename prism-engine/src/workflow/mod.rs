//! Question-answering workflows over the indexed corpus.
//!
//! A project's workflow is a list of sections, each holding ordered
//! questions, stored in `workflow_config.json`. Answers accumulate in
//! `output/results.json`, keyed by section and question id, written
//! incrementally by the [`SectionWorkflow`] collaborator as it answers.
//! [`WorkflowStore`] manages both files; [`SectionRunner`] executes a
//! section fire-and-forget, polling the results file for progress.

mod runner;
mod store;
mod types;

pub use runner::{SectionRunner, SectionWorkflow, WorkflowTask, WorkflowTaskTracker};
pub use store::WorkflowStore;
pub use types::{
    NewQuestion, NewSection, ProjectResults, Question, QuestionAnswer, QuestionResult,
    QuestionUpdate, ResultsFile, Section, SectionAnswers, SectionResults, SectionSummary,
    SectionUpdate, WorkflowConfig,
};
