//! Cross-module scenarios exercising the engine end to end.

use crate::prelude::*;
use crate::testing::{populate_pipeline_output, MockSearchResourceClient};
use crate::testing::ScriptedSectionWorkflow;
use crate::workflow::NewSection;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A chunking executor that splits each extraction result in half and
/// reports per-document progress, the way a real stage would.
struct SplittingChunkExecutor;

#[async_trait]
impl StageExecutor for SplittingChunkExecutor {
    async fn run(&self, ctx: &StageContext, _options: &StageOptions) -> anyhow::Result<()> {
        let sources = ctx
            .storage
            .list_files(&ctx.project_id, "output/extraction_results", true)
            .await;
        let total = sources.len() as u64;

        for (i, file) in sources.iter().enumerate() {
            let bytes = ctx
                .storage
                .read_file(&ctx.project_id, &file.path)
                .await
                .ok_or_else(|| anyhow::anyhow!("missing extraction result {}", file.path))?;
            let text = String::from_utf8_lossy(&bytes);
            let mid = text.len() / 2;
            let chunks = serde_json::json!({ "chunks": [&text[..mid], &text[mid..]] });

            let stem = file.name.trim_end_matches(".md");
            let out = format!("output/chunked_documents/{stem}_chunks.json");
            ctx.storage
                .write_json(&ctx.project_id, &out, &chunks)
                .await;

            ctx.progress
                .report((i + 1) as u64, total, format!("Chunked {}", file.name));
        }
        Ok(())
    }
}

async fn wait_pipeline_terminal(runner: &PipelineRunner, task_id: Uuid) -> Task {
    for _ in 0..200 {
        if let Some(task) = runner.task(task_id) {
            if task.status.is_terminal() {
                return task;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task never reached a terminal state");
}

#[tokio::test]
async fn test_chunk_stage_end_to_end() {
    let storage = Arc::new(MemoryStorage::new());
    storage.create_project("demo").await;
    populate_pipeline_output(storage.as_ref(), "demo").await;
    // Start from a clean chunk output so only this run's files remain.
    for file in storage.list_files("demo", "output/chunked_documents", true).await {
        storage.delete_file("demo", &file.path).await;
    }

    let runner = PipelineRunner::new(storage.clone())
        .with_executor(PipelineStage::Chunk, Arc::new(SplittingChunkExecutor));

    let task = runner.run_stage("demo", PipelineStage::Chunk, StageOptions::default());
    let finished = wait_pipeline_terminal(&runner, task.id).await;

    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.progress.percent, 100.0);
    assert_eq!(finished.progress.message, "Chunked b.md");

    let chunked = storage.list_files("demo", "output/chunked_documents", true).await;
    assert_eq!(chunked.len(), 2);
    let value = storage
        .read_json("demo", "output/chunked_documents/a_chunks.json")
        .await
        .unwrap();
    assert_eq!(value["chunks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_section_run_then_results_aggregation() {
    let storage = Arc::new(MemoryStorage::new());
    storage.create_project("demo").await;
    let store = WorkflowStore::new(storage);
    store
        .create_section(
            "demo",
            NewSection {
                id: Some("technical".into()),
                name: "Technical".into(),
                questions: vec![
                    Question {
                        id: "q1".into(),
                        question: "What is the rated capacity?".into(),
                        instructions: None,
                        order: None,
                    },
                    Question {
                        id: "q2".into(),
                        question: "What is the grid connection voltage?".into(),
                        instructions: None,
                        order: None,
                    },
                ],
                ..NewSection::default()
            },
        )
        .await
        .unwrap();

    let workflow = Arc::new(ScriptedSectionWorkflow::new(store.clone()));
    let runner = crate::workflow::SectionRunner::new(store.clone(), workflow)
        .with_poll_interval(Duration::from_millis(5));

    let task = runner.run_section("demo", "technical").await.unwrap();
    let finished = loop {
        match runner.task_status(task.task_id) {
            Some(t) if t.status.is_terminal() => break t,
            _ => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    };

    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.questions_completed, 2);

    let results = store.get_project_results("demo").await.unwrap();
    assert_eq!(results.total_questions, 2);
    assert_eq!(results.answered_questions, 2);
    assert_eq!(results.sections[0].section_id, "technical");

    let summaries = store.list_sections("demo").await;
    assert_eq!(summaries[0].completion_percentage, 100.0);
}

#[tokio::test]
async fn test_preview_then_rollback_index_cascade() {
    let storage = Arc::new(MemoryStorage::new());
    storage.create_project("demo").await;
    populate_pipeline_output(storage.as_ref(), "demo").await;
    crate::project::update_status(storage.as_ref(), "demo", |status| {
        status.is_indexed = true;
        status.has_agent = true;
        status.agent_name = Some("prism-demo-index-agent".into());
    })
    .await;

    let search = Arc::new(MockSearchResourceClient::new());
    let engine = RollbackEngine::new(storage.clone(), search.clone());

    let before = storage.file_count();
    let preview = engine.preview("demo", "index", true).await.unwrap();
    assert_eq!(preview.stages, vec!["index", "source", "agent"]);
    assert_eq!(storage.file_count(), before);

    let result = engine.rollback("demo", "index", true).await;
    assert!(result.success);
    assert_eq!(result.deleted_resources, vec!["agent", "source", "index"]);
    assert_eq!(search.deleted_indexes(), vec!["demo"]);
    assert_eq!(search.deleted_sources(), vec!["demo"]);
    assert_eq!(search.deleted_agents(), vec!["demo"]);

    // Local artifacts survive an external-resources-only cascade.
    assert!(
        !storage
            .list_files("demo", "output/embedded_documents", true)
            .await
            .is_empty()
    );

    let config = crate::project::load_config(storage.as_ref(), "demo").await.unwrap();
    assert!(!config.status.is_indexed);
    assert!(!config.status.has_agent);
    assert!(config.status.agent_name.is_none());
}
