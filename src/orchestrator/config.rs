use crate::config::Config;
use crate::constants::{
    DEFAULT_CHAT_MODEL, DEFAULT_CODER_MODEL, DEFAULT_MAX_SIMILAR_RESULTS,
    DEFAULT_SIMILARITY_THRESHOLD,
};

#[derive(Debug, Clone, PartialEq)]
/// Model routing and similarity settings for [`super::Orchestrator`].
pub struct OrchestratorConfig {
    /// General model: quality review, hints, task generation, dialogue.
    pub chat_model: String,
    /// Code-specialized model: authenticity review.
    pub coder_model: String,
    pub similarity_threshold: f32,
    pub max_similar_results: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            coder_model: DEFAULT_CODER_MODEL.to_string(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_similar_results: DEFAULT_MAX_SIMILAR_RESULTS,
        }
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            chat_model: config.models.chat.clone(),
            coder_model: config.models.coder.clone(),
            similarity_threshold: config.similarity_threshold,
            max_similar_results: config.max_similar_results,
        }
    }
}
