//! Workflow configuration and results value objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One question within a workflow section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question id, unique within its section.
    pub id: String,
    /// The question text.
    pub question: String,
    /// Optional answering instructions passed to the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Optional explicit ordering key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// One workflow section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section id, unique within the project.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional answer template identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Questions in order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// The full workflow configuration, stored at `workflow_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Sections in display order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl WorkflowConfig {
    /// Finds a section by id.
    #[must_use]
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Finds a section by id, mutably.
    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }
}

/// A recorded answer to one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Answer text; blank means unanswered.
    #[serde(default)]
    pub answer: String,
    /// Source reference supporting the answer.
    #[serde(default)]
    pub reference: String,
    /// Reviewer or agent comments.
    #[serde(default)]
    pub comments: String,
    /// Optional structured evaluation, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<serde_json::Value>,
}

impl QuestionAnswer {
    /// True when the answer text is non-blank.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }

    /// True when the answer is non-blank and not the `"N/A"` placeholder.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_answered() && self.answer.trim() != "N/A"
    }
}

/// Answers recorded for one section, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionAnswers {
    /// Answers by question id.
    #[serde(default)]
    pub questions: BTreeMap<String, QuestionAnswer>,
}

/// The results file, stored at `output/results.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    /// Per-section answers, keyed by section id.
    #[serde(default)]
    pub sections: BTreeMap<String, SectionAnswers>,
}

impl ResultsFile {
    /// Number of answers recorded for a section (answered or not).
    #[must_use]
    pub fn recorded_count(&self, section_id: &str) -> usize {
        self.sections
            .get(section_id)
            .map_or(0, |s| s.questions.len())
    }
}

/// Completion summary for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    /// Section id.
    pub section_id: String,
    /// Section display name.
    pub section_name: String,
    /// Number of configured questions.
    pub question_count: usize,
    /// Number of completed answers.
    pub completed_count: usize,
    /// Completion as a percentage, rounded to two decimals.
    pub completion_percentage: f64,
}

/// One question with its recorded answer, for result exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// Question id.
    pub question_id: String,
    /// Question text.
    pub question_name: String,
    /// Answer text, when recorded and non-empty.
    pub answer: Option<String>,
    /// Source reference, when recorded and non-empty.
    pub reference: Option<String>,
    /// Comments, when recorded and non-empty.
    pub comments: Option<String>,
    /// Structured evaluation, when recorded.
    pub evaluation: Option<serde_json::Value>,
}

/// Results for one section, in configured question order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResults {
    /// Section id.
    pub section_id: String,
    /// Section display name.
    pub section_name: String,
    /// Question results in configured order.
    pub questions: Vec<QuestionResult>,
}

/// Aggregated results across every configured section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectResults {
    /// Project the results belong to.
    pub project_id: String,
    /// Total configured questions across sections.
    pub total_questions: usize,
    /// Questions with a non-blank answer.
    pub answered_questions: usize,
    /// Per-section results, in configured section order.
    pub sections: Vec<SectionResults>,
}

/// Input for creating a section. Omitted ids are generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSection {
    /// Explicit id; generated as `section_{n}` when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional answer template identifier.
    #[serde(default)]
    pub template: Option<String>,
    /// Initial questions.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Partial update for a section. `None` fields keep their current value;
/// the id is never changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New template identifier.
    #[serde(default)]
    pub template: Option<String>,
    /// Replacement question list.
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

/// Input for adding a question. Omitted ids are generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuestion {
    /// Explicit id; generated as `q{n}` when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Question text.
    pub question: String,
    /// Optional answering instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Optional ordering key.
    #[serde(default)]
    pub order: Option<u32>,
}

/// Partial update for a question. `None` fields keep their current value;
/// the id is never changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdate {
    /// New question text.
    #[serde(default)]
    pub question: Option<String>,
    /// New answering instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// New ordering key.
    #[serde(default)]
    pub order: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_completed_excludes_blank_and_na() {
        let blank = QuestionAnswer::default();
        assert!(!blank.is_answered());
        assert!(!blank.is_completed());

        let na = QuestionAnswer {
            answer: " N/A ".into(),
            ..QuestionAnswer::default()
        };
        assert!(na.is_answered());
        assert!(!na.is_completed());

        let real = QuestionAnswer {
            answer: "42 GW".into(),
            ..QuestionAnswer::default()
        };
        assert!(real.is_completed());
    }

    #[test]
    fn test_config_decodes_with_missing_optionals() {
        let config: WorkflowConfig = serde_json::from_value(serde_json::json!({
            "sections": [
                { "id": "section_1", "name": "Overview",
                  "questions": [{ "id": "q1", "question": "What is the scope?" }] }
            ]
        }))
        .unwrap();

        let section = config.section("section_1").unwrap();
        assert_eq!(section.questions.len(), 1);
        assert!(section.template.is_none());
        assert!(section.questions[0].instructions.is_none());
    }

    #[test]
    fn test_empty_results_file_decodes() {
        let results: ResultsFile = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(results.sections.is_empty());
        assert_eq!(results.recorded_count("section_1"), 0);
    }
}
