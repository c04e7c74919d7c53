//! Scriptable in-memory inference backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::backend::InferenceBackend;
use super::error::{GatewayError, GatewayResult};
use super::streaming::ChatStream;
use super::types::{ChatReply, ChatRequest};
use crate::ratelimit::RateLimiter;

/// Dimension of embeddings synthesized for texts without a scripted vector.
pub const MOCK_EMBEDDING_DIM: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Failure a scripted model should produce.
pub enum MockFailure {
    Status(u16),
    Malformed,
    Timeout,
    Network,
}

impl MockFailure {
    fn into_error(self, model: &str) -> GatewayError {
        let model = model.to_string();
        match self {
            MockFailure::Status(status) => GatewayError::UpstreamStatus {
                model,
                status,
                body: "mock failure".to_string(),
            },
            MockFailure::Malformed => GatewayError::MalformedResponse {
                model,
                reason: "mock malformed body".to_string(),
            },
            MockFailure::Timeout => GatewayError::Timeout {
                model,
                after: Duration::from_secs(60),
            },
            MockFailure::Network => GatewayError::Network {
                model,
                message: "mock connection reset".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Fail(MockFailure),
}

#[derive(Debug, Clone)]
struct Rule {
    model: String,
    needle: Option<String>,
    outcome: Outcome,
}

#[derive(Default)]
struct Counters {
    started: AtomicUsize,
    completed: AtomicUsize,
}

/// Backend whose replies, failures and latencies are configured per model.
///
/// Rules are matched in insertion order; a rule with a needle only applies when some
/// message of the request contains it. Unscripted chat calls reply with `"{}"`.
/// Unscripted embeddings are derived from a hash of the text, so identical texts get
/// identical vectors.
#[derive(Default)]
pub struct MockInferenceBackend {
    rules: Mutex<Vec<Rule>>,
    delays: Mutex<HashMap<String, Duration>>,
    fragments: Mutex<HashMap<String, Vec<String>>>,
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    embed_failure: Mutex<Option<MockFailure>>,
    counters: Mutex<HashMap<String, Arc<Counters>>>,
    requests: Mutex<Vec<ChatRequest>>,
    embed_calls: AtomicUsize,
    limiter: Option<Arc<RateLimiter>>,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes every call through `limiter` first, like the real gateway.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Replies to every call for `model` with `reply`.
    pub fn with_reply(self, model: &str, reply: impl Into<String>) -> Self {
        self.push_rule(model, None, Outcome::Reply(reply.into()));
        self
    }

    /// Replies with `reply` when a message for `model` contains `needle`.
    pub fn with_reply_matching(
        self,
        model: &str,
        needle: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        self.push_rule(model, Some(needle.into()), Outcome::Reply(reply.into()));
        self
    }

    /// Fails every call for `model`.
    pub fn with_failure(self, model: &str, failure: MockFailure) -> Self {
        self.push_rule(model, None, Outcome::Fail(failure));
        self
    }

    /// Sleeps `delay` before answering calls for `model`.
    pub fn with_delay(self, model: &str, delay: Duration) -> Self {
        self.delays.lock().insert(model.to_string(), delay);
        self
    }

    /// Streams these fragments for streaming calls to `model`.
    pub fn with_stream_fragments(self, model: &str, fragments: Vec<String>) -> Self {
        self.fragments.lock().insert(model.to_string(), fragments);
        self
    }

    /// Returns `vector` when `text` is embedded.
    pub fn with_embedding(self, text: &str, vector: Vec<f32>) -> Self {
        self.embeddings.lock().insert(text.to_string(), vector);
        self
    }

    /// Fails every embedding call.
    pub fn with_embed_failure(self, failure: MockFailure) -> Self {
        *self.embed_failure.lock() = Some(failure);
        self
    }

    /// Chat calls issued for `model`, including ones still running or cancelled.
    pub fn calls_started(&self, model: &str) -> usize {
        self.counters(model).started.load(Ordering::SeqCst)
    }

    /// Chat calls for `model` that produced a result.
    pub fn calls_completed(&self, model: &str) -> usize {
        self.counters(model).completed.load(Ordering::SeqCst)
    }

    /// Total chat calls across models.
    pub fn total_chat_calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Every chat request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    fn push_rule(&self, model: &str, needle: Option<String>, outcome: Outcome) {
        self.rules.lock().push(Rule {
            model: model.to_string(),
            needle,
            outcome,
        });
    }

    fn counters(&self, model: &str) -> Arc<Counters> {
        Arc::clone(self.counters.lock().entry(model.to_string()).or_default())
    }

    fn outcome_for(&self, request: &ChatRequest) -> Outcome {
        let rules = self.rules.lock();
        let matches = |rule: &&Rule| {
            rule.model == request.model
                && rule.needle.as_ref().is_none_or(|needle| {
                    request.messages.iter().any(|m| m.content.contains(needle))
                })
        };

        let by_needle = rules
            .iter()
            .filter(|rule| rule.needle.is_some())
            .find(matches);
        let fallback = || rules.iter().filter(|rule| rule.needle.is_none()).find(matches);

        by_needle
            .or_else(fallback)
            .map(|rule| rule.outcome.clone())
            .unwrap_or_else(|| Outcome::Reply("{}".to_string()))
    }
}

/// Deterministic unit-free vector for `text`.
pub fn synthetic_embedding(text: &str) -> Vec<f32> {
    let mut reader = blake3::Hasher::new().update(text.as_bytes()).finalize_xof();
    let mut bytes = [0u8; MOCK_EMBEDDING_DIM];
    reader.fill(&mut bytes);
    bytes.iter().map(|&b| f32::from(b) / 255.0 - 0.5).collect()
}

impl InferenceBackend for MockInferenceBackend {
    async fn chat(&self, request: ChatRequest) -> GatewayResult<ChatReply> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire(&request.model).await;
        }

        let counters = self.counters(&request.model);
        counters.started.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let delay = self.delays.lock().get(&request.model).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome_for(&request);
        counters.completed.fetch_add(1, Ordering::SeqCst);

        let content = match outcome {
            Outcome::Reply(content) => content,
            Outcome::Fail(failure) => return Err(failure.into_error(&request.model)),
        };

        let latency = delay.unwrap_or_default();
        if !request.stream {
            return Ok(ChatReply::Complete { content, latency });
        }

        let fragments = self
            .fragments
            .lock()
            .get(&request.model)
            .cloned()
            .unwrap_or_else(|| vec![content]);
        let stream = ChatStream::from_fragments(fragments.into_iter().map(Ok).collect::<Vec<_>>());
        Ok(ChatReply::Streaming { stream, latency })
    }

    async fn embed(&self, model: &str, text: &str) -> GatewayResult<Vec<f32>> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire(model).await;
        }
        self.embed_calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.embed_failure.lock().clone();
        if let Some(failure) = failure {
            return Err(failure.into_error(model));
        }

        let scripted = self.embeddings.lock().get(text).cloned();
        Ok(scripted.unwrap_or_else(|| synthetic_embedding(text)))
    }
}
