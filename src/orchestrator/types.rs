//! Inputs and outputs of the evaluation pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::similarity::SimilarMatch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The task a submission answers.
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            level: None,
            domain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Client-side behaviour signals collected outside this crate.
pub struct Telemetry {
    #[serde(default)]
    pub paste_events: u32,
    #[serde(default)]
    pub devtools_opens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Sandbox run of the submission, as reported by the executor.
pub struct ExecutionReport {
    pub stdout: String,
    pub stderr: String,
    pub visible_passed: u32,
    pub visible_total: u32,
    pub hidden_passed: u32,
    pub hidden_total: u32,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Candidate code to evaluate.
pub struct Submission {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub telemetry: Telemetry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionReport>,
}

impl Submission {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            telemetry: Telemetry::default(),
            execution: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionReport) -> Self {
        self.execution = Some(execution);
        self
    }
}

/// Evaluation cache identity. Telemetry is not part of the key.
#[derive(Debug, Serialize)]
pub(crate) struct EvaluationKey<'a> {
    pub task_id: &'a str,
    pub code: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Reviewer feedback attached to a quality assessment.
pub struct Feedback {
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub complexity_analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parsed reply of the quality branch. Scores are on a 0-100 scale.
pub struct QualityAssessment {
    pub correctness_score: f64,
    pub code_quality_score: f64,
    pub efficiency_score: f64,
    pub edge_cases_score: f64,
    pub overall_score: f64,
    pub feedback: Feedback,
    pub next_challenge_level: Option<String>,
}

impl QualityAssessment {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_score("correctness_score", self.correctness_score)?;
        check_score("code_quality_score", self.code_quality_score)?;
        check_score("efficiency_score", self.efficiency_score)?;
        check_score("edge_cases_score", self.edge_cases_score)?;
        check_score("overall_score", self.overall_score)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parsed reply of the authenticity branch.
pub struct AuthenticityAssessment {
    /// Resemblance to well-known solutions, 0-100.
    pub similarity_score: f64,
    pub is_suspicious: bool,
    pub likely_source: String,
    pub reasoning: String,
    pub confidence: String,
    pub flags: Vec<String>,
    pub recommendation: String,
}

impl AuthenticityAssessment {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_score("similarity_score", self.similarity_score)
    }
}

fn check_score(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} must be within 0..=100, got {value}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Coding-style profile from the code model. Not part of the verdict.
pub struct CodeStyleAnalysis {
    /// `low`, `medium` or `high`.
    pub style_confidence: String,
    /// `junior`, `middle` or `senior`.
    pub coding_level: String,
    pub common_patterns: Vec<String>,
    pub unusual_aspects: Vec<String>,
    pub suggests_external_help: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Summary of an indexed solution that resembled the submission.
pub struct SimilarSolution {
    pub id: Uuid,
    pub source: String,
    pub domain: String,
    pub level: String,
    pub similarity: f32,
}

impl From<&SimilarMatch> for SimilarSolution {
    fn from(m: &SimilarMatch) -> Self {
        Self {
            id: m.record.id,
            source: m.record.metadata.source.clone(),
            domain: m.record.metadata.domain.clone(),
            level: m.record.metadata.level.clone(),
            similarity: m.similarity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Outcome of the embedding branch.
pub struct EmbeddingAssessment {
    /// Best cosine similarity in `[0, 1]`; `0` without matches.
    pub best_similarity: f32,
    pub exact_match: bool,
    pub matches: Vec<SimilarSolution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Aggregated verdict for one submission.
pub struct SuspicionVerdict {
    pub task_id: String,
    pub correctness: f64,
    pub code_quality: f64,
    pub efficiency: f64,
    pub edge_cases: f64,
    pub overall: f64,
    /// Weighted suspicion signal; not capped at 100.
    pub suspicious_score: f64,
    /// Authenticity branch similarity, 0-100.
    pub llm_similarity: f64,
    /// Best embedding match scaled to 0-100.
    pub embedding_similarity: f64,
    pub is_suspicious: bool,
    pub likely_source: String,
    pub recommendation: String,
    pub feedback: Feedback,
    pub similar_solutions: Vec<SimilarSolution>,
    pub exact_match: bool,
    pub next_challenge_level: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Difficulty of the next task.
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskExample {
    pub input: String,
    pub output: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenTest {
    pub input: String,
    pub output: String,
    pub edge_case_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Interview task produced by the chat model.
pub struct GeneratedTask {
    pub title: String,
    pub description: String,
    pub input_format: String,
    pub output_format: String,
    pub constraints: Vec<String>,
    pub examples: Vec<TaskExample>,
    pub hidden_tests: Vec<HiddenTest>,
    pub time_limit: String,
    pub memory_limit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Interview state shown to the dialogue model.
pub struct InterviewContext {
    pub task_title: Option<String>,
    pub task_description: Option<String>,
    pub code_submitted: bool,
    pub test_status: Option<String>,
    pub candidate_level: Option<String>,
}
