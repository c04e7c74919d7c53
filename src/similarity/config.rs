use crate::config::Config;
use crate::constants::{
    DEFAULT_EMBEDDING_MODEL, DEFAULT_MAX_SIMILAR_RESULTS, DEFAULT_SIMILARITY_THRESHOLD,
};

#[derive(Debug, Clone, PartialEq)]
/// Settings for [`super::SimilarityIndex`].
pub struct SimilarityConfig {
    /// Model used for every embedding call.
    pub embedding_model: String,
    /// Default minimum cosine similarity for a match.
    pub threshold: f32,
    /// Default cap on returned matches.
    pub max_results: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_SIMILAR_RESULTS,
        }
    }
}

impl From<&Config> for SimilarityConfig {
    fn from(config: &Config) -> Self {
        Self {
            embedding_model: config.models.embedding.clone(),
            threshold: config.similarity_threshold,
            max_results: config.max_similar_results,
        }
    }
}
