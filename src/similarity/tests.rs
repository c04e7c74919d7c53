use super::*;
use std::sync::Arc;

use crate::gateway::{MockFailure, MockInferenceBackend};

fn index_with(
    backend: MockInferenceBackend,
) -> (Arc<MockInferenceBackend>, SimilarityIndex<MockInferenceBackend>) {
    let backend = Arc::new(backend);
    let index = SimilarityIndex::new(Arc::clone(&backend), SimilarityConfig::default());
    (backend, index)
}

fn meta(source: &str, domain: &str) -> SolutionMetadata {
    SolutionMetadata::new(source, domain, "junior")
}

#[test]
fn test_cosine_similarity_basics() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    let diagonal = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
    assert!((diagonal - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
}

#[test]
fn test_cosine_similarity_clamps_negative_to_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
}

#[test]
fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
}

#[tokio::test]
async fn test_find_similar_on_empty_index_skips_embedding() {
    let (backend, index) = index_with(MockInferenceBackend::new());

    let matches = index.find_similar("def f(): pass", 0.5, 5).await.unwrap();

    assert!(matches.is_empty());
    assert_eq!(backend.embed_calls(), 0);
}

#[tokio::test]
async fn test_add_known_solution_embeds_and_appends() {
    let (backend, index) = index_with(MockInferenceBackend::new());

    let record = index
        .add_known_solution("def two_sum(): ...", meta("leetcode", "algorithms"))
        .await
        .unwrap();

    assert_eq!(backend.embed_calls(), 1);
    assert_eq!(index.len(), 1);
    assert_eq!(record.code_hash, crate::hashing::hash_code("def two_sum(): ..."));
    assert_eq!(record.metadata.source, "leetcode");
}

#[tokio::test]
async fn test_add_known_solution_propagates_embedding_failure() {
    let (_, index) =
        index_with(MockInferenceBackend::new().with_embed_failure(MockFailure::Timeout));

    let err = index
        .add_known_solution("code", meta("github", "backend"))
        .await
        .unwrap_err();

    assert!(matches!(err, SimilarityError::Embedding(_)));
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_find_similar_sorts_filters_and_truncates() {
    let backend = MockInferenceBackend::new().with_embedding("query", vec![1.0, 0.0]);
    let (_, index) = index_with(backend);

    index.insert_with_embedding("exact", vec![1.0, 0.0], meta("a", "x"));
    index.insert_with_embedding("close", vec![0.9, 0.1], meta("b", "x"));
    index.insert_with_embedding("far", vec![0.0, 1.0], meta("c", "x"));
    index.insert_with_embedding("near", vec![0.8, 0.3], meta("d", "x"));

    let matches = index.find_similar("query", 0.85, 5).await.unwrap();
    let codes: Vec<&str> = matches.iter().map(|m| m.record.code.as_str()).collect();
    assert_eq!(codes, vec!["exact", "close", "near"]);
    assert!(matches.windows(2).all(|w| w[0].similarity >= w[1].similarity));

    let top = index.find_similar("query", 0.85, 1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].record.code, "exact");
}

#[tokio::test]
async fn test_find_similar_threshold_is_monotonic() {
    let backend = MockInferenceBackend::new();
    let (_, index) = index_with(backend);

    for i in 0..20 {
        let code = format!("def solution_{i}(): return {i}");
        index
            .add_known_solution(&code, meta("github", "algorithms"))
            .await
            .unwrap();
    }

    let query = crate::gateway::synthetic_embedding("def solution_3(): return 3");
    let mut previous = usize::MAX;
    for step in 0..=20 {
        let threshold = step as f32 / 20.0;
        let count = index.find_similar_by_embedding(&query, threshold, usize::MAX).len();
        assert!(count <= previous, "threshold {threshold} returned {count} > {previous}");
        previous = count;
    }
}

#[test]
fn test_find_exact_match_ignores_whitespace_changes() {
    let (_, index) = index_with(MockInferenceBackend::new());
    index.insert_with_embedding(
        "def add(a, b):\n    return a + b\n",
        vec![1.0],
        meta("leetcode", "algorithms"),
    );

    let hit = index.find_exact_match("\n\n  def add(a, b):   \n\n\treturn a + b");
    assert!(hit.is_some());

    let miss = index.find_exact_match("def add(a, b):\n    return a - b\n");
    assert!(miss.is_none());
}

#[test]
fn test_find_exact_match_returns_first_inserted() {
    let (_, index) = index_with(MockInferenceBackend::new());
    index.insert_with_embedding("x = 1", vec![1.0], meta("first", "d"));
    index.insert_with_embedding("  x = 1  ", vec![1.0], meta("second", "d"));

    let hit = index.find_exact_match("x = 1").unwrap();
    assert_eq!(hit.metadata.source, "first");
}

#[test]
fn test_stats_and_clear() {
    let (_, index) = index_with(MockInferenceBackend::new());
    index.insert_with_embedding("a", vec![1.0], meta("leetcode", "algorithms"));
    index.insert_with_embedding("b", vec![1.0], meta("leetcode", "backend"));
    index.insert_with_embedding("c", vec![1.0], meta("chatgpt", "algorithms"));

    let stats = index.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_source["leetcode"], 2);
    assert_eq!(stats.by_source["chatgpt"], 1);
    assert_eq!(stats.by_domain["algorithms"], 2);

    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.stats(), IndexStats::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_and_scans() {
    let (_, index) = index_with(MockInferenceBackend::new());
    let index = Arc::new(index);

    let writers: Vec<_> = (0..8)
        .map(|w| {
            let index = Arc::clone(&index);
            tokio::spawn(async move {
                for i in 0..25 {
                    let code = format!("fn w{w}_{i}() {{}}");
                    index.add_known_solution(&code, meta("github", "rust")).await.unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let index = Arc::clone(&index);
        tokio::spawn(async move {
            let query = crate::gateway::synthetic_embedding("probe");
            for _ in 0..200 {
                for m in index.find_similar_by_embedding(&query, 0.0, usize::MAX) {
                    assert_eq!(m.record.embedding.len(), crate::gateway::mock::MOCK_EMBEDDING_DIM);
                    assert_eq!(m.record.code_hash, crate::hashing::hash_code(&m.record.code));
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    assert_eq!(index.len(), 200);
}
