use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::config::SimilarityConfig;
use super::error::SimilarityResult;
use super::types::{EmbeddingRecord, IndexStats, SimilarMatch, SolutionMetadata};
use crate::gateway::InferenceBackend;
use crate::hashing::hash_code;

/// Cosine similarity of `a` and `b`, clamped to `[0, 1]`.
///
/// Mismatched lengths, empty inputs and zero-norm vectors all score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}

/// Append-only, in-memory store of known solutions.
///
/// Records are built completely before being pushed under the write lock, and scans
/// work on a snapshot of `Arc`s, so a concurrent scan sees a record either whole or
/// not at all.
pub struct SimilarityIndex<B: InferenceBackend> {
    backend: Arc<B>,
    config: SimilarityConfig,
    records: RwLock<Vec<Arc<EmbeddingRecord>>>,
}

impl<B: InferenceBackend> SimilarityIndex<B> {
    pub fn new(backend: Arc<B>, config: SimilarityConfig) -> Self {
        Self {
            backend,
            config,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Embeds `code` and appends it to the index.
    #[instrument(
        skip(self, code, metadata),
        fields(source = %metadata.source, domain = %metadata.domain)
    )]
    pub async fn add_known_solution(
        &self,
        code: &str,
        metadata: SolutionMetadata,
    ) -> SimilarityResult<Arc<EmbeddingRecord>> {
        let embedding = self.embed(code).await?;
        let record = self.insert_with_embedding(code, embedding, metadata);
        info!(total = self.len(), "Known solution indexed");
        Ok(record)
    }

    /// Appends a record whose embedding is already known. No upstream call.
    pub fn insert_with_embedding(
        &self,
        code: &str,
        embedding: Vec<f32>,
        metadata: SolutionMetadata,
    ) -> Arc<EmbeddingRecord> {
        let record = Arc::new(EmbeddingRecord {
            id: Uuid::new_v4(),
            code: code.to_string(),
            code_hash: hash_code(code),
            embedding,
            metadata,
            added_at: Utc::now(),
        });

        self.records.write().push(Arc::clone(&record));
        record
    }

    /// Embeds `code` with the configured model.
    pub async fn embed(&self, code: &str) -> SimilarityResult<Vec<f32>> {
        Ok(self
            .backend
            .embed(&self.config.embedding_model, code)
            .await?)
    }

    /// Records with cosine similarity `>= threshold` to `code`, best first.
    ///
    /// Returns empty without calling upstream when the index is empty.
    #[instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn find_similar(
        &self,
        code: &str,
        threshold: f32,
        max_results: usize,
    ) -> SimilarityResult<Vec<SimilarMatch>> {
        if self.is_empty() {
            debug!("Index empty, skipping embedding");
            return Ok(Vec::new());
        }

        let embedding = self.embed(code).await?;
        Ok(self.find_similar_by_embedding(&embedding, threshold, max_results))
    }

    /// Scores every record against a precomputed embedding.
    pub fn find_similar_by_embedding(
        &self,
        embedding: &[f32],
        threshold: f32,
        max_results: usize,
    ) -> Vec<SimilarMatch> {
        let snapshot = self.snapshot();

        let mut matches: Vec<SimilarMatch> = snapshot
            .into_iter()
            .filter_map(|record| {
                let similarity = cosine_similarity(embedding, &record.embedding);
                (similarity >= threshold).then_some(SimilarMatch { record, similarity })
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(max_results);

        debug!(matches = matches.len(), threshold, "Similarity scan complete");
        matches
    }

    /// First record whose normalized code hash equals that of `code`.
    pub fn find_exact_match(&self, code: &str) -> Option<Arc<EmbeddingRecord>> {
        let hash = hash_code(code);
        self.records
            .read()
            .iter()
            .find(|record| record.code_hash == hash)
            .cloned()
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot();
        let mut stats = IndexStats {
            total: snapshot.len(),
            ..Default::default()
        };

        for record in &snapshot {
            *stats
                .by_source
                .entry(record.metadata.source.clone())
                .or_default() += 1;
            *stats
                .by_domain
                .entry(record.metadata.domain.clone())
                .or_default() += 1;
        }
        stats
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.records.write().clear();
        info!("Similarity index cleared");
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<EmbeddingRecord>> {
        self.records.read().clone()
    }
}

impl<B: InferenceBackend> std::fmt::Debug for SimilarityIndex<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("config", &self.config)
            .field("records", &self.len())
            .finish()
    }
}
