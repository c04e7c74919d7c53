//! Evaluation pipeline: quality, authenticity and embedding signals merged into one
//! verdict, plus hints, task generation and the interviewer dialogue.

pub mod config;
pub mod dialogue;
pub mod engine;
pub mod error;
pub mod parse;
mod prompts;
pub mod scoring;
pub mod types;


pub use config::OrchestratorConfig;
pub use dialogue::DialogueStream;
pub use engine::Orchestrator;
pub use error::{BranchKind, OrchestratorError, OrchestratorResult};
pub use parse::extract_json;
pub use scoring::{decide_next_difficulty, suspicious_score};
pub use types::{
    AuthenticityAssessment, CodeStyleAnalysis, Difficulty, EmbeddingAssessment, ExecutionReport,
    Feedback, GeneratedTask, HiddenTest, InterviewContext, QualityAssessment, SimilarSolution,
    Submission, SuspicionVerdict, Task, TaskExample, Telemetry,
};
