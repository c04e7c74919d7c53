//! Pure scoring rules: suspicion aggregate and next-task difficulty.

use super::types::{Difficulty, Telemetry};
use crate::constants::{
    DEVTOOLS_OPEN_WEIGHT, EMBEDDING_SIMILARITY_WEIGHT, LLM_SIMILARITY_WEIGHT, PASTE_EVENT_WEIGHT,
};

const HARD_SCORE_ABOVE: f64 = 80.0;
const HARD_TIME_BELOW_SECS: u64 = 600;
const EASY_SCORE_BELOW: f64 = 50.0;

/// Weighted suspicion signal.
///
/// `llm_similarity` and `embedding_similarity` are on a 0-100 scale.
pub fn suspicious_score(
    telemetry: &Telemetry,
    llm_similarity: f64,
    embedding_similarity: f64,
) -> f64 {
    f64::from(telemetry.paste_events) * PASTE_EVENT_WEIGHT
        + f64::from(telemetry.devtools_opens) * DEVTOOLS_OPEN_WEIGHT
        + llm_similarity * LLM_SIMILARITY_WEIGHT
        + embedding_similarity * EMBEDDING_SIMILARITY_WEIGHT
}

/// Picks the next task's difficulty from the last score and time spent.
pub fn decide_next_difficulty(score: f64, time_spent_secs: u64) -> Difficulty {
    if score > HARD_SCORE_ABOVE && time_spent_secs < HARD_TIME_BELOW_SECS {
        Difficulty::Hard
    } else if score < EASY_SCORE_BELOW {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}
