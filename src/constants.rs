//! Cross-cutting, shared constants.
//!
//! Model ids and limits mirror the upstream inference deployment. Everything here is a
//! default: [`crate::config::Config`] can override each value from the environment.

use std::time::Duration;

/// General-purpose chat model (quality review, hints, task generation, dialogue).
pub const DEFAULT_CHAT_MODEL: &str = "qwen3-32b-awq";
/// Code-specialized model (authenticity review).
pub const DEFAULT_CODER_MODEL: &str = "qwen3-coder-30b-a3b-instruct-fp8";
/// Embedding model (similarity index).
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-m3";

/// Requests per window for the chat model.
pub const DEFAULT_CHAT_LIMIT: usize = 2;
/// Requests per window for the coder model.
pub const DEFAULT_CODER_LIMIT: usize = 2;
/// Requests per window for the embedding model.
pub const DEFAULT_EMBEDDING_LIMIT: usize = 7;

/// Length of the trailing rate-limit window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Whole-call deadline for one gateway request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_TASK_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_EVAL_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_CONVERSATION_TTL_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;
pub const DEFAULT_MAX_SIMILAR_RESULTS: usize = 5;

/// Max entries held by the in-process cache store.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Messages of dialogue history sent upstream and persisted per session.
pub const MAX_DIALOGUE_HISTORY: usize = 20;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Weights of the suspicion aggregate.
pub const PASTE_EVENT_WEIGHT: f64 = 20.0;
pub const DEVTOOLS_OPEN_WEIGHT: f64 = 30.0;
pub const LLM_SIMILARITY_WEIGHT: f64 = 0.5;
pub const EMBEDDING_SIMILARITY_WEIGHT: f64 = 0.3;
