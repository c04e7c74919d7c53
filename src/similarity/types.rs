use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Provenance of a known solution.
pub struct SolutionMetadata {
    /// Where the solution came from (`leetcode`, `chatgpt`, `github`, ...).
    pub source: String,
    pub domain: String,
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl SolutionMetadata {
    pub fn new(
        source: impl Into<String>,
        domain: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            domain: domain.into(),
            level: level.into(),
            task_id: None,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// One indexed solution. Never mutated after it is published.
pub struct EmbeddingRecord {
    pub id: Uuid,
    pub code: String,
    /// Hash of the whitespace-normalized code.
    pub code_hash: String,
    pub embedding: Vec<f32>,
    pub metadata: SolutionMetadata,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// A record that scored at or above the requested threshold.
pub struct SimilarMatch {
    pub record: Arc<EmbeddingRecord>,
    /// Cosine similarity in `[0, 1]`.
    pub similarity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Index composition.
pub struct IndexStats {
    pub total: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_domain: BTreeMap<String, usize>,
}
