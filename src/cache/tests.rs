use super::*;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::advance;

use crate::gateway::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Verdict {
    overall: f64,
    feedback: String,
}

fn verdict() -> Verdict {
    Verdict {
        overall: 72.5,
        feedback: "solid".to_string(),
    }
}

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let cache: ResultCache = ResultCache::default();
    let input = json!({"task_id": "t-1", "code": "print(1)", "language": "python"});

    cache
        .set(CacheNamespace::Evaluation, &input, &verdict(), Duration::from_secs(300))
        .await;
    let cached: Option<Verdict> = cache.get(CacheNamespace::Evaluation, &input).await;

    assert_eq!(cached, Some(verdict()));
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache: ResultCache = ResultCache::default();

    cache
        .set(CacheNamespace::Evaluation, "k", &verdict(), Duration::from_secs(300))
        .await;

    advance(Duration::from_secs(299)).await;
    assert!(cache.get::<_, Verdict>(CacheNamespace::Evaluation, "k").await.is_some());

    advance(Duration::from_secs(1)).await;
    assert!(cache.get::<_, Verdict>(CacheNamespace::Evaluation, "k").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_put_uses_namespace_ttl() {
    let ttls = CacheTtls {
        task: Duration::from_secs(100),
        evaluation: Duration::from_secs(10),
        conversation: Duration::from_secs(50),
    };
    let cache = ResultCache::new(MemoryStore::new(100), ttls);

    cache.cache_task("junior", "algorithms", &json!({"title": "Two Sum"})).await;
    cache.cache_evaluation("submission", &verdict()).await;

    advance(Duration::from_secs(10)).await;
    assert!(cache.get_evaluation::<_, Verdict>("submission").await.is_none());
    assert!(cache.get_task::<serde_json::Value>("junior", "algorithms").await.is_some());

    advance(Duration::from_secs(90)).await;
    assert!(cache.get_task::<serde_json::Value>("junior", "algorithms").await.is_none());
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let cache: ResultCache = ResultCache::default();

    cache.put(CacheNamespace::Task, "same-input", &1u32).await;
    cache.put(CacheNamespace::Evaluation, "same-input", &2u32).await;

    assert_eq!(cache.get::<_, u32>(CacheNamespace::Task, "same-input").await, Some(1));
    assert_eq!(cache.get::<_, u32>(CacheNamespace::Evaluation, "same-input").await, Some(2));
    assert_eq!(cache.get::<_, u32>(CacheNamespace::Conversation, "same-input").await, None);
}

#[tokio::test]
async fn test_key_is_field_order_independent() {
    let a = json!({"level": "middle", "domain": "backend"});
    let b = json!({"domain": "backend", "level": "middle"});

    let key_a = ResultCache::<MemoryStore>::key(CacheNamespace::Task, &a).unwrap();
    let key_b = ResultCache::<MemoryStore>::key(CacheNamespace::Task, &b).unwrap();

    assert_eq!(key_a, key_b);
    assert!(key_a.starts_with("task:"));
    assert_eq!(key_a.len(), "task:".len() + 64);

    let cache: ResultCache = ResultCache::default();
    cache.put(CacheNamespace::Task, &a, "cached").await;
    assert_eq!(
        cache.get::<_, String>(CacheNamespace::Task, &b).await.as_deref(),
        Some("cached")
    );
}

#[tokio::test]
async fn test_task_helpers_match_generic_key() {
    let cache: ResultCache = ResultCache::default();
    cache.cache_task("senior", "ml", &json!({"title": "KNN"})).await;

    let via_generic: Option<serde_json::Value> = cache
        .get(CacheNamespace::Task, &json!({"domain": "ml", "level": "senior"}))
        .await;
    assert_eq!(via_generic, Some(json!({"title": "KNN"})));
}

#[tokio::test]
async fn test_delete_removes_entry() {
    let cache: ResultCache = ResultCache::default();
    cache.put(CacheNamespace::Evaluation, "k", &verdict()).await;

    cache.delete(CacheNamespace::Evaluation, "k").await;

    assert!(cache.get::<_, Verdict>(CacheNamespace::Evaluation, "k").await.is_none());
}

#[tokio::test]
async fn test_unexpected_shape_is_a_miss() {
    let cache: ResultCache = ResultCache::default();
    cache.put(CacheNamespace::Evaluation, "k", &json!({"unrelated": true})).await;

    assert!(cache.get::<_, Verdict>(CacheNamespace::Evaluation, "k").await.is_none());
}

#[tokio::test]
async fn test_unavailable_store_degrades_silently() {
    let cache = ResultCache::new(UnavailableStore, CacheTtls::default());

    cache.put(CacheNamespace::Evaluation, "k", &verdict()).await;
    cache.delete(CacheNamespace::Evaluation, "k").await;

    assert!(cache.get::<_, Verdict>(CacheNamespace::Evaluation, "k").await.is_none());
    assert!(cache.get_conversation("session").await.is_empty());
    assert_eq!(
        cache.stats(),
        CacheStats {
            backend: "unavailable",
            entries: None
        }
    );
}

#[tokio::test]
async fn test_conversation_history_round_trip() {
    let cache: ResultCache = ResultCache::default();
    let history = vec![
        ChatMessage::user("How should I start?"),
        ChatMessage::assistant("Think about the edge cases first."),
    ];

    assert!(cache.get_conversation("s-1").await.is_empty());
    cache.cache_conversation("s-1", &history).await;

    assert_eq!(cache.get_conversation("s-1").await, history);
    assert!(cache.get_conversation("s-2").await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stats_count_live_entries_only() {
    let cache: ResultCache = ResultCache::default();
    cache
        .set(CacheNamespace::Task, "short", &1, Duration::from_secs(5))
        .await;
    cache
        .set(CacheNamespace::Task, "long", &2, Duration::from_secs(500))
        .await;

    assert_eq!(cache.stats().entries, Some(2));
    assert_eq!(cache.stats().backend, "memory");

    advance(Duration::from_secs(6)).await;
    assert_eq!(cache.stats().entries, Some(1));
}

#[test]
fn test_namespace_prefixes() {
    assert_eq!(CacheNamespace::Task.key("abc"), "task:abc");
    assert_eq!(CacheNamespace::Evaluation.key("abc"), "eval:abc");
    assert_eq!(CacheNamespace::Conversation.to_string(), "conversation");
}

#[test]
fn test_default_ttls() {
    let ttls = CacheTtls::default();
    assert_eq!(ttls.for_namespace(CacheNamespace::Task), Duration::from_secs(86_400));
    assert_eq!(ttls.for_namespace(CacheNamespace::Evaluation), Duration::from_secs(3_600));
    assert_eq!(
        ttls.for_namespace(CacheNamespace::Conversation),
        Duration::from_secs(86_400)
    );
}
