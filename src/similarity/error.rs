use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
/// Errors returned by the similarity index.
pub enum SimilarityError {
    /// Embedding the code failed upstream.
    #[error("embedding failed: {0}")]
    Embedding(#[from] GatewayError),
}

/// Convenience result type for similarity operations.
pub type SimilarityResult<T> = Result<T, SimilarityError>;
