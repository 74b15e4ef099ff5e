//! Persistence and editing of workflow configuration and results.

use super::types::{
    NewQuestion, NewSection, ProjectResults, Question, QuestionResult, QuestionUpdate,
    ResultsFile, Section, SectionResults, SectionSummary, SectionUpdate, WorkflowConfig,
};
use crate::storage::StorageGateway;
use std::sync::Arc;

const CONFIG_PATH: &str = "workflow_config.json";
const RESULTS_PATH: &str = "output/results.json";

fn none_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Reads and edits a project's workflow config and results.
#[derive(Clone)]
pub struct WorkflowStore {
    storage: Arc<dyn StorageGateway>,
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore").finish_non_exhaustive()
    }
}

impl WorkflowStore {
    /// Creates a store over a storage gateway.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    /// Loads the workflow config; empty when absent or malformed.
    pub async fn load_config(&self, project: &str) -> WorkflowConfig {
        match self.storage.read_json(project, CONFIG_PATH).await {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => WorkflowConfig::default(),
        }
    }

    /// Saves the workflow config. Returns success.
    pub async fn save_config(&self, project: &str, config: &WorkflowConfig) -> bool {
        match serde_json::to_value(config) {
            Ok(value) => self.storage.write_json(project, CONFIG_PATH, &value).await,
            Err(_) => false,
        }
    }

    /// Loads the results file; empty when absent or malformed.
    pub async fn load_results(&self, project: &str) -> ResultsFile {
        match self.storage.read_json(project, RESULTS_PATH).await {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => ResultsFile::default(),
        }
    }

    /// Saves the results file. Returns success.
    pub async fn save_results(&self, project: &str, results: &ResultsFile) -> bool {
        match serde_json::to_value(results) {
            Ok(value) => self.storage.write_json(project, RESULTS_PATH, &value).await,
            Err(_) => false,
        }
    }

    /// Lists sections with completion counts against the recorded answers.
    pub async fn list_sections(&self, project: &str) -> Vec<SectionSummary> {
        let config = self.load_config(project).await;
        let results = self.load_results(project).await;

        config
            .sections
            .iter()
            .map(|section| {
                let answers = results.sections.get(&section.id);
                let completed_count = section
                    .questions
                    .iter()
                    .filter(|q| {
                        answers
                            .and_then(|a| a.questions.get(&q.id))
                            .is_some_and(super::types::QuestionAnswer::is_completed)
                    })
                    .count();
                let question_count = section.questions.len();
                #[allow(clippy::cast_precision_loss)]
                let percentage = if question_count == 0 {
                    0.0
                } else {
                    completed_count as f64 / question_count as f64 * 100.0
                };
                SectionSummary {
                    section_id: section.id.clone(),
                    section_name: section.name.clone(),
                    question_count,
                    completed_count,
                    completion_percentage: (percentage * 100.0).round() / 100.0,
                }
            })
            .collect()
    }

    /// Fetches one section by id.
    pub async fn get_section(&self, project: &str, section_id: &str) -> Option<Section> {
        self.load_config(project).await.section(section_id).cloned()
    }

    /// Fetches a section's questions; empty when the section is unknown.
    pub async fn section_questions(&self, project: &str, section_id: &str) -> Vec<Question> {
        self.get_section(project, section_id)
            .await
            .map(|s| s.questions)
            .unwrap_or_default()
    }

    /// Appends a new section, generating `section_{n}` ids when absent.
    /// Returns the stored section, or `None` when the save fails.
    pub async fn create_section(&self, project: &str, input: NewSection) -> Option<Section> {
        let mut config = self.load_config(project).await;
        let id = input
            .id
            .unwrap_or_else(|| format!("section_{}", config.sections.len() + 1));
        let section = Section {
            id,
            name: input.name,
            template: input.template,
            questions: input.questions,
        };
        config.sections.push(section.clone());

        if self.save_config(project, &config).await {
            Some(section)
        } else {
            None
        }
    }

    /// Updates a section in place. The id is preserved; omitted fields keep
    /// their current values. Returns the updated section, `None` when the
    /// section is unknown or the save fails.
    pub async fn update_section(
        &self,
        project: &str,
        section_id: &str,
        update: SectionUpdate,
    ) -> Option<Section> {
        let mut config = self.load_config(project).await;
        let section = config.section_mut(section_id)?;

        if let Some(name) = update.name {
            section.name = name;
        }
        if let Some(template) = update.template {
            section.template = Some(template);
        }
        if let Some(questions) = update.questions {
            section.questions = questions;
        }
        let updated = section.clone();

        if self.save_config(project, &config).await {
            Some(updated)
        } else {
            None
        }
    }

    /// Removes a section. Returns false when no such section exists.
    pub async fn delete_section(&self, project: &str, section_id: &str) -> bool {
        let mut config = self.load_config(project).await;
        let before = config.sections.len();
        config.sections.retain(|s| s.id != section_id);
        if config.sections.len() == before {
            return false;
        }
        self.save_config(project, &config).await
    }

    /// Appends a question to a section, generating `q{n}` ids when absent.
    pub async fn add_question(
        &self,
        project: &str,
        section_id: &str,
        input: NewQuestion,
    ) -> Option<Question> {
        let mut config = self.load_config(project).await;
        let section = config.section_mut(section_id)?;

        let id = input
            .id
            .unwrap_or_else(|| format!("q{}", section.questions.len() + 1));
        let question = Question {
            id,
            question: input.question,
            instructions: input.instructions,
            order: input.order,
        };
        section.questions.push(question.clone());

        if self.save_config(project, &config).await {
            Some(question)
        } else {
            None
        }
    }

    /// Merges an update into a question; the id is preserved.
    pub async fn update_question(
        &self,
        project: &str,
        section_id: &str,
        question_id: &str,
        update: QuestionUpdate,
    ) -> Option<Question> {
        let mut config = self.load_config(project).await;
        let section = config.section_mut(section_id)?;
        let question = section.questions.iter_mut().find(|q| q.id == question_id)?;

        if let Some(text) = update.question {
            question.question = text;
        }
        if let Some(instructions) = update.instructions {
            question.instructions = Some(instructions);
        }
        if let Some(order) = update.order {
            question.order = Some(order);
        }
        let updated = question.clone();

        if self.save_config(project, &config).await {
            Some(updated)
        } else {
            None
        }
    }

    /// Removes a question from a section. Returns false when absent.
    pub async fn delete_question(
        &self,
        project: &str,
        section_id: &str,
        question_id: &str,
    ) -> bool {
        let mut config = self.load_config(project).await;
        let Some(section) = config.section_mut(section_id) else {
            return false;
        };
        let before = section.questions.len();
        section.questions.retain(|q| q.id != question_id);
        if section.questions.len() == before {
            return false;
        }
        self.save_config(project, &config).await
    }

    /// Replaces a section's entire question list (bulk import).
    pub async fn replace_section_questions(
        &self,
        project: &str,
        section_id: &str,
        questions: Vec<Question>,
    ) -> bool {
        let mut config = self.load_config(project).await;
        let Some(section) = config.section_mut(section_id) else {
            return false;
        };
        section.questions = questions;
        self.save_config(project, &config).await
    }

    /// Discards all recorded answers for a section. Returns the number of
    /// answers cleared; zero when the section has none recorded.
    pub async fn clear_section_answers(&self, project: &str, section_id: &str) -> usize {
        let mut results = self.load_results(project).await;
        let Some(answers) = results.sections.get_mut(section_id) else {
            return 0;
        };
        let cleared = answers.questions.len();
        answers.questions.clear();

        if self.save_results(project, &results).await {
            cleared
        } else {
            0
        }
    }

    /// Aggregates recorded answers against the configured sections, in
    /// configured order. `None` when no answers have been recorded at all.
    pub async fn get_project_results(&self, project: &str) -> Option<ProjectResults> {
        let results = self.load_results(project).await;
        if results.sections.is_empty() {
            return None;
        }
        let config = self.load_config(project).await;

        let mut total_questions = 0;
        let mut answered_questions = 0;
        let mut sections = Vec::with_capacity(config.sections.len());

        for section in &config.sections {
            let answers = results.sections.get(&section.id);
            let mut questions = Vec::with_capacity(section.questions.len());

            for q in &section.questions {
                total_questions += 1;
                let recorded = answers.and_then(|a| a.questions.get(&q.id));
                if recorded.is_some_and(super::types::QuestionAnswer::is_answered) {
                    answered_questions += 1;
                }
                questions.push(QuestionResult {
                    question_id: q.id.clone(),
                    question_name: q.question.clone(),
                    answer: recorded.and_then(|r| none_if_empty(&r.answer)),
                    reference: recorded.and_then(|r| none_if_empty(&r.reference)),
                    comments: recorded.and_then(|r| none_if_empty(&r.comments)),
                    evaluation: recorded.and_then(|r| r.evaluation.clone()),
                });
            }

            sections.push(SectionResults {
                section_id: section.id.clone(),
                section_name: section.name.clone(),
                questions,
            });
        }

        Some(ProjectResults {
            project_id: project.to_string(),
            total_questions,
            answered_questions,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::workflow::types::{QuestionAnswer, SectionAnswers};
    use pretty_assertions::assert_eq;

    fn store() -> (Arc<MemoryStorage>, WorkflowStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), WorkflowStore::new(storage))
    }

    async fn seed_section(store: &WorkflowStore, questions: &[&str]) -> Section {
        store
            .create_section(
                "demo",
                NewSection {
                    name: "Technical".into(),
                    questions: questions
                        .iter()
                        .enumerate()
                        .map(|(i, q)| Question {
                            id: format!("q{}", i + 1),
                            question: (*q).to_string(),
                            instructions: None,
                            order: None,
                        })
                        .collect(),
                    ..NewSection::default()
                },
            )
            .await
            .unwrap()
    }

    async fn record_answer(store: &WorkflowStore, section_id: &str, qid: &str, answer: &str) {
        let mut results = store.load_results("demo").await;
        results
            .sections
            .entry(section_id.to_string())
            .or_insert_with(SectionAnswers::default)
            .questions
            .insert(
                qid.to_string(),
                QuestionAnswer {
                    answer: answer.to_string(),
                    ..QuestionAnswer::default()
                },
            );
        assert!(store.save_results("demo", &results).await);
    }

    #[tokio::test]
    async fn test_create_section_generates_sequential_ids() {
        let (_storage, store) = store();

        let first = store
            .create_section("demo", NewSection { name: "A".into(), ..NewSection::default() })
            .await
            .unwrap();
        let second = store
            .create_section("demo", NewSection { name: "B".into(), ..NewSection::default() })
            .await
            .unwrap();

        assert_eq!(first.id, "section_1");
        assert_eq!(second.id, "section_2");
        assert_eq!(store.load_config("demo").await.sections.len(), 2);
    }

    #[tokio::test]
    async fn test_create_section_honors_explicit_id() {
        let (_storage, store) = store();
        let section = store
            .create_section(
                "demo",
                NewSection {
                    id: Some("technical".into()),
                    name: "Technical".into(),
                    ..NewSection::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(section.id, "technical");
    }

    #[tokio::test]
    async fn test_update_section_preserves_id_and_questions() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["What is the capacity?"]).await;

        let updated = store
            .update_section(
                "demo",
                &section.id,
                SectionUpdate { name: Some("Renamed".into()), ..SectionUpdate::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, section.id);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.questions.len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_section_returns_none() {
        let (_storage, store) = store();
        assert!(
            store
                .update_section("demo", "ghost", SectionUpdate::default())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_section_reports_absence() {
        let (_storage, store) = store();
        let section = seed_section(&store, &[]).await;

        assert!(store.delete_section("demo", &section.id).await);
        assert!(!store.delete_section("demo", &section.id).await);
    }

    #[tokio::test]
    async fn test_add_question_generates_id_within_section() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["First?"]).await;

        let added = store
            .add_question(
                "demo",
                &section.id,
                NewQuestion { question: "Second?".into(), ..NewQuestion::default() },
            )
            .await
            .unwrap();

        assert_eq!(added.id, "q2");
        assert_eq!(store.section_questions("demo", &section.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_question_merges_fields() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["What voltage?"]).await;

        let updated = store
            .update_question(
                "demo",
                &section.id,
                "q1",
                QuestionUpdate {
                    instructions: Some("Cite the datasheet.".into()),
                    ..QuestionUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, "q1");
        assert_eq!(updated.question, "What voltage?");
        assert_eq!(updated.instructions.as_deref(), Some("Cite the datasheet."));
    }

    #[tokio::test]
    async fn test_delete_question_and_replace_all() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["One?", "Two?"]).await;

        assert!(store.delete_question("demo", &section.id, "q1").await);
        assert!(!store.delete_question("demo", &section.id, "q1").await);

        let imported = vec![Question {
            id: "imported_1".into(),
            question: "Imported?".into(),
            instructions: None,
            order: Some(1),
        }];
        assert!(
            store
                .replace_section_questions("demo", &section.id, imported)
                .await
        );
        let questions = store.section_questions("demo", &section.id).await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "imported_1");
    }

    #[tokio::test]
    async fn test_list_sections_counts_completed_answers() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["One?", "Two?", "Three?"]).await;

        record_answer(&store, &section.id, "q1", "A real answer").await;
        record_answer(&store, &section.id, "q2", "N/A").await;

        let summaries = store.list_sections("demo").await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].question_count, 3);
        assert_eq!(summaries[0].completed_count, 1);
        assert_eq!(summaries[0].completion_percentage, 33.33);
    }

    #[tokio::test]
    async fn test_list_sections_empty_section_is_zero_percent() {
        let (_storage, store) = store();
        seed_section(&store, &[]).await;

        let summaries = store.list_sections("demo").await;
        assert_eq!(summaries[0].completion_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_clear_section_answers_returns_count() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["One?", "Two?"]).await;
        record_answer(&store, &section.id, "q1", "yes").await;
        record_answer(&store, &section.id, "q2", "no").await;

        assert_eq!(store.clear_section_answers("demo", &section.id).await, 2);
        assert_eq!(store.clear_section_answers("demo", &section.id).await, 0);
        assert_eq!(store.clear_section_answers("demo", "ghost").await, 0);
    }

    #[tokio::test]
    async fn test_project_results_none_without_answers() {
        let (_storage, store) = store();
        seed_section(&store, &["One?"]).await;
        assert!(store.get_project_results("demo").await.is_none());
    }

    #[tokio::test]
    async fn test_project_results_totals_and_order() {
        let (_storage, store) = store();
        let section = seed_section(&store, &["One?", "Two?"]).await;
        record_answer(&store, &section.id, "q2", "Only the second").await;

        let results = store.get_project_results("demo").await.unwrap();
        assert_eq!(results.project_id, "demo");
        assert_eq!(results.total_questions, 2);
        assert_eq!(results.answered_questions, 1);

        let questions = &results.sections[0].questions;
        assert_eq!(questions[0].question_id, "q1");
        assert!(questions[0].answer.is_none());
        assert_eq!(questions[1].answer.as_deref(), Some("Only the second"));
    }

    #[tokio::test]
    async fn test_malformed_config_reads_as_empty() {
        let (storage, store) = store();
        storage
            .write_file("demo", "workflow_config.json", b"not json")
            .await;
        assert!(store.load_config("demo").await.sections.is_empty());
    }
}
