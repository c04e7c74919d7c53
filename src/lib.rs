//! Sentinel library crate (used by the `sentinel` binary and integration tests).
//!
//! Rate-limited orchestration of upstream inference calls for coding-interview
//! submissions: quality review, authenticity review and embedding similarity merged
//! into one cached verdict, plus hints, adaptive task generation and a streaming
//! interviewer dialogue.
//!
//! # Public API Surface
//!
//! ## Services
//! - [`RateLimiter`] - Per-model sliding-window quotas
//! - [`ModelGateway`], [`InferenceBackend`] - OpenAI-compatible chat and embedding calls
//! - [`ResultCache`], [`MemoryStore`] - Namespaced TTL cache
//! - [`SimilarityIndex`] - Embedding and exact-hash plagiarism lookups
//! - [`Orchestrator`] - Fail-fast evaluation pipeline
//! - [`EvaluationQueue`] - Bounded job queue with a worker pool
//! - [`ServiceContext`] - Builds all of the above from a [`Config`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod context;
pub mod gateway;
pub mod hashing;
pub mod orchestrator;
pub mod queue;
pub mod ratelimit;
pub mod similarity;

#[cfg(any(test, feature = "mock"))]
pub use cache::UnavailableStore;
pub use cache::{
    CacheError, CacheNamespace, CacheStats, CacheStore, CacheTtls, MemoryStore, ResultCache,
};
pub use config::{Config, ConfigError, ModelSet};
pub use context::{ContextError, ServiceContext};
#[cfg(any(test, feature = "mock"))]
pub use gateway::{MockFailure, MockInferenceBackend};
pub use gateway::{
    ChatMessage, ChatReply, ChatRequest, ChatStream, GatewayConfig, GatewayError, GatewayResult,
    InferenceBackend, ModelGateway,
};
pub use hashing::{hash_canonical, hash_code, normalize_code};
pub use orchestrator::{
    BranchKind, CodeStyleAnalysis, DialogueStream, Difficulty, GeneratedTask, InterviewContext,
    Orchestrator, OrchestratorConfig, OrchestratorError, OrchestratorResult, Submission,
    SuspicionVerdict, Task, Telemetry, decide_next_difficulty,
};
pub use queue::{EvaluationQueue, QueueError, QueueResult, Ticket};
pub use ratelimit::RateLimiter;
pub use similarity::{
    EmbeddingRecord, SimilarMatch, SimilarityConfig, SimilarityError, SimilarityIndex,
    SolutionMetadata, cosine_similarity,
};
