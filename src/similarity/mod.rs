//! In-memory plagiarism index over code embeddings.
//!
//! Two lookups: a cosine-similarity scan over stored embeddings, and a cheap exact
//! match on the hash of whitespace-normalized code.

pub mod config;
pub mod error;
pub mod index;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::SimilarityConfig;
pub use error::{SimilarityError, SimilarityResult};
pub use index::{SimilarityIndex, cosine_similarity};
pub use types::{EmbeddingRecord, IndexStats, SimilarMatch, SolutionMetadata};
