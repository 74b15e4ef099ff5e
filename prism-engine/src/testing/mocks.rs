//! Mock collaborators for testing.

use crate::errors::ResourceError;
use crate::rollback::SearchResourceClient;
use crate::stages::{StageContext, StageExecutor, StageOptions};
use crate::workflow::{QuestionAnswer, Section, SectionWorkflow, WorkflowStore};
use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;

/// One recorded call to a [`MockStageExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorCall {
    /// Project the stage was run against.
    pub project_id: String,
    /// Options the run was triggered with.
    pub options: StageOptions,
}

/// A stage executor that records calls and succeeds.
#[derive(Debug, Default)]
pub struct MockStageExecutor {
    calls: Mutex<Vec<ExecutorCall>>,
    progress: Option<(u64, u64, String)>,
}

impl MockStageExecutor {
    /// Creates an executor that succeeds without reporting progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the executor report one progress update before succeeding.
    #[must_use]
    pub fn with_progress(mut self, current: u64, total: u64, message: impl Into<String>) -> Self {
        self.progress = Some((current, total, message.into()));
        self
    }

    /// Returns the number of times the executor was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StageExecutor for MockStageExecutor {
    async fn run(&self, ctx: &StageContext, options: &StageOptions) -> anyhow::Result<()> {
        self.calls.lock().push(ExecutorCall {
            project_id: ctx.project_id.clone(),
            options: options.clone(),
        });
        if let Some((current, total, message)) = &self.progress {
            ctx.progress.report(*current, *total, message.clone());
        }
        Ok(())
    }
}

/// A stage executor that always fails with a fixed message.
#[derive(Debug)]
pub struct FailingStageExecutor {
    message: String,
}

impl FailingStageExecutor {
    /// Creates an executor failing with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl StageExecutor for FailingStageExecutor {
    async fn run(&self, _ctx: &StageContext, _options: &StageOptions) -> anyhow::Result<()> {
        bail!("{}", self.message)
    }
}

#[derive(Debug, Default)]
struct RecordedDeletions {
    indexes: Vec<String>,
    sources: Vec<String>,
    agents: Vec<String>,
}

/// A search-resource client that records deletions, with per-resource
/// failure switches.
#[derive(Debug, Default)]
pub struct MockSearchResourceClient {
    deletions: Mutex<RecordedDeletions>,
    fail_index: Option<String>,
    fail_source: Option<String>,
    fail_agent: Option<String>,
}

impl MockSearchResourceClient {
    /// Creates a client where every deletion succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes index deletion fail with the given message.
    #[must_use]
    pub fn failing_index(mut self, message: impl Into<String>) -> Self {
        self.fail_index = Some(message.into());
        self
    }

    /// Makes knowledge-source deletion fail with the given message.
    #[must_use]
    pub fn failing_source(mut self, message: impl Into<String>) -> Self {
        self.fail_source = Some(message.into());
        self
    }

    /// Makes knowledge-agent deletion fail with the given message.
    #[must_use]
    pub fn failing_agent(mut self, message: impl Into<String>) -> Self {
        self.fail_agent = Some(message.into());
        self
    }

    /// Projects whose index deletion was requested and succeeded.
    #[must_use]
    pub fn deleted_indexes(&self) -> Vec<String> {
        self.deletions.lock().indexes.clone()
    }

    /// Projects whose knowledge-source deletion succeeded.
    #[must_use]
    pub fn deleted_sources(&self) -> Vec<String> {
        self.deletions.lock().sources.clone()
    }

    /// Projects whose knowledge-agent deletion succeeded.
    #[must_use]
    pub fn deleted_agents(&self) -> Vec<String> {
        self.deletions.lock().agents.clone()
    }
}

#[async_trait]
impl SearchResourceClient for MockSearchResourceClient {
    async fn delete_index(&self, project: &str) -> Result<(), ResourceError> {
        if let Some(message) = &self.fail_index {
            return Err(ResourceError::new(message.clone()));
        }
        self.deletions.lock().indexes.push(project.to_string());
        Ok(())
    }

    async fn delete_knowledge_source(&self, project: &str) -> Result<(), ResourceError> {
        if let Some(message) = &self.fail_source {
            return Err(ResourceError::new(message.clone()));
        }
        self.deletions.lock().sources.push(project.to_string());
        Ok(())
    }

    async fn delete_knowledge_agent(&self, project: &str) -> Result<(), ResourceError> {
        if let Some(message) = &self.fail_agent {
            return Err(ResourceError::new(message.clone()));
        }
        self.deletions.lock().agents.push(project.to_string());
        Ok(())
    }
}

/// A section workflow that answers every configured question through the
/// results file, like a real workflow does.
pub struct ScriptedSectionWorkflow {
    store: WorkflowStore,
    fail_after: Option<(usize, String)>,
}

impl ScriptedSectionWorkflow {
    /// Creates a workflow that answers every question and succeeds.
    #[must_use]
    pub fn new(store: WorkflowStore) -> Self {
        Self {
            store,
            fail_after: None,
        }
    }

    /// Makes the workflow fail after recording the given number of answers.
    #[must_use]
    pub fn failing_after(mut self, answered: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((answered, message.into()));
        self
    }
}

impl std::fmt::Debug for ScriptedSectionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSectionWorkflow")
            .field("fail_after", &self.fail_after)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SectionWorkflow for ScriptedSectionWorkflow {
    async fn run(&self, project: &str, section: &Section) -> anyhow::Result<()> {
        for (answered, question) in section.questions.iter().enumerate() {
            if let Some((limit, message)) = &self.fail_after {
                if answered == *limit {
                    bail!("{message}");
                }
            }
            let mut results = self.store.load_results(project).await;
            results
                .sections
                .entry(section.id.clone())
                .or_default()
                .questions
                .insert(
                    question.id.clone(),
                    QuestionAnswer {
                        answer: format!("Scripted answer to: {}", question.question),
                        reference: "scripted".to_string(),
                        ..QuestionAnswer::default()
                    },
                );
            if !self.store.save_results(project, &results).await {
                bail!("failed to persist answer for '{}'", question.id);
            }
        }
        Ok(())
    }
}
