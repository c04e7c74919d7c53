//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SENTINEL_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CHAT_LIMIT, DEFAULT_CHAT_MODEL, DEFAULT_CODER_LIMIT,
    DEFAULT_CODER_MODEL, DEFAULT_CONVERSATION_TTL_SECS, DEFAULT_EMBEDDING_LIMIT,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EVAL_TTL_SECS, DEFAULT_MAX_SIMILAR_RESULTS,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_TASK_TTL_SECS, DEFAULT_WORKERS,
};

/// Default inference endpoint used when `SENTINEL_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// The three upstream models a verdict is assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// General chat model.
    pub chat: String,
    /// Code-specialized model.
    pub coder: String,
    /// Embedding model.
    pub embedding: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            chat: DEFAULT_CHAT_MODEL.to_string(),
            coder: DEFAULT_CODER_MODEL.to_string(),
            embedding: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SENTINEL_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Inference API base URL. Default: `http://localhost:8000/v1`.
    pub base_url: String,

    /// Bearer token sent with every upstream call.
    pub api_key: String,

    /// Whole-call deadline per gateway request. Default: 60s.
    pub request_timeout: Duration,

    /// Upstream model ids.
    pub models: ModelSet,

    /// Requests per 60s window for the chat model. Default: `2`.
    pub chat_limit: usize,

    /// Requests per 60s window for the coder model. Default: `2`.
    pub coder_limit: usize,

    /// Requests per 60s window for the embedding model. Default: `7`.
    pub embedding_limit: usize,

    /// TTL of generated tasks. Default: 24h.
    pub task_ttl: Duration,

    /// TTL of evaluation verdicts. Default: 1h.
    pub eval_ttl: Duration,

    /// TTL of dialogue history. Default: 24h.
    pub conversation_ttl: Duration,

    /// Minimum cosine similarity reported as a match. Default: `0.85`.
    pub similarity_threshold: f32,

    /// Max matches returned per similarity query. Default: `5`.
    pub max_similar_results: usize,

    /// Max entries in the in-process cache store. Default: `10_000`.
    pub cache_capacity: u64,

    /// Evaluation worker count. Default: `4`.
    pub workers: usize,

    /// Bounded evaluation queue length. Default: `64`.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            models: ModelSet::default(),
            chat_limit: DEFAULT_CHAT_LIMIT,
            coder_limit: DEFAULT_CODER_LIMIT,
            embedding_limit: DEFAULT_EMBEDDING_LIMIT,
            task_ttl: Duration::from_secs(DEFAULT_TASK_TTL_SECS),
            eval_ttl: Duration::from_secs(DEFAULT_EVAL_TTL_SECS),
            conversation_ttl: Duration::from_secs(DEFAULT_CONVERSATION_TTL_SECS),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_similar_results: DEFAULT_MAX_SIMILAR_RESULTS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_BASE_URL: &'static str = "SENTINEL_BASE_URL";
    const ENV_API_KEY: &'static str = "SENTINEL_API_KEY";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "SENTINEL_REQUEST_TIMEOUT_SECS";
    const ENV_CHAT_MODEL: &'static str = "SENTINEL_CHAT_MODEL";
    const ENV_CODER_MODEL: &'static str = "SENTINEL_CODER_MODEL";
    const ENV_EMBEDDING_MODEL: &'static str = "SENTINEL_EMBEDDING_MODEL";
    const ENV_CHAT_LIMIT: &'static str = "SENTINEL_CHAT_LIMIT";
    const ENV_CODER_LIMIT: &'static str = "SENTINEL_CODER_LIMIT";
    const ENV_EMBEDDING_LIMIT: &'static str = "SENTINEL_EMBEDDING_LIMIT";
    const ENV_TASK_TTL_SECS: &'static str = "SENTINEL_TASK_TTL_SECS";
    const ENV_EVAL_TTL_SECS: &'static str = "SENTINEL_EVAL_TTL_SECS";
    const ENV_CONVERSATION_TTL_SECS: &'static str = "SENTINEL_CONVERSATION_TTL_SECS";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "SENTINEL_SIMILARITY_THRESHOLD";
    const ENV_MAX_SIMILAR_RESULTS: &'static str = "SENTINEL_MAX_SIMILAR_RESULTS";
    const ENV_CACHE_CAPACITY: &'static str = "SENTINEL_CACHE_CAPACITY";
    const ENV_WORKERS: &'static str = "SENTINEL_WORKERS";
    const ENV_QUEUE_CAPACITY: &'static str = "SENTINEL_QUEUE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = Self::parse_string_from_env(Self::ENV_BASE_URL, defaults.base_url);
        let api_key = Self::parse_string_from_env(Self::ENV_API_KEY, defaults.api_key);
        let request_timeout =
            Self::parse_secs_from_env(Self::ENV_REQUEST_TIMEOUT_SECS, defaults.request_timeout)?;

        let models = ModelSet {
            chat: Self::parse_string_from_env(Self::ENV_CHAT_MODEL, defaults.models.chat),
            coder: Self::parse_string_from_env(Self::ENV_CODER_MODEL, defaults.models.coder),
            embedding: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.models.embedding,
            ),
        };

        let chat_limit = Self::parse_from_env(Self::ENV_CHAT_LIMIT, defaults.chat_limit)?;
        let coder_limit = Self::parse_from_env(Self::ENV_CODER_LIMIT, defaults.coder_limit)?;
        let embedding_limit =
            Self::parse_from_env(Self::ENV_EMBEDDING_LIMIT, defaults.embedding_limit)?;

        let task_ttl = Self::parse_secs_from_env(Self::ENV_TASK_TTL_SECS, defaults.task_ttl)?;
        let eval_ttl = Self::parse_secs_from_env(Self::ENV_EVAL_TTL_SECS, defaults.eval_ttl)?;
        let conversation_ttl = Self::parse_secs_from_env(
            Self::ENV_CONVERSATION_TTL_SECS,
            defaults.conversation_ttl,
        )?;

        let similarity_threshold = Self::parse_from_env(
            Self::ENV_SIMILARITY_THRESHOLD,
            defaults.similarity_threshold,
        )?;
        let max_similar_results =
            Self::parse_from_env(Self::ENV_MAX_SIMILAR_RESULTS, defaults.max_similar_results)?;
        let cache_capacity =
            Self::parse_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity)?;
        let workers = Self::parse_from_env(Self::ENV_WORKERS, defaults.workers)?;
        let queue_capacity =
            Self::parse_from_env(Self::ENV_QUEUE_CAPACITY, defaults.queue_capacity)?;

        Ok(Self {
            base_url,
            api_key,
            request_timeout,
            models,
            chat_limit,
            coder_limit,
            embedding_limit,
            task_ttl,
            eval_ttl,
            conversation_ttl,
            similarity_threshold,
            max_similar_results,
            cache_capacity,
            workers,
            queue_capacity,
        })
    }

    /// Validates basic invariants (does not contact the upstream).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
            });
        }

        for (role, id) in [
            ("chat", &self.models.chat),
            ("coder", &self.models.coder),
            ("embedding", &self.models.embedding),
        ] {
            if id.trim().is_empty() {
                return Err(ConfigError::EmptyModelId { role });
            }
        }

        let positive = [
            ("request_timeout", self.request_timeout.as_millis() as usize),
            ("chat_limit", self.chat_limit),
            ("coder_limit", self.coder_limit),
            ("embedding_limit", self.embedding_limit),
            ("max_similar_results", self.max_similar_results),
            ("workers", self.workers),
            ("queue_capacity", self.queue_capacity),
        ];
        if let Some(&(name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroValue { name });
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.similarity_threshold,
            });
        }

        Ok(())
    }

    /// Per-model request limits keyed by model id.
    ///
    /// If two roles share a model id the stricter limit wins.
    pub fn rate_limits(&self) -> HashMap<String, usize> {
        let mut limits = HashMap::new();
        for (model, limit) in [
            (&self.models.chat, self.chat_limit),
            (&self.models.coder, self.coder_limit),
            (&self.models.embedding, self.embedding_limit),
        ] {
            limits
                .entry(model.clone())
                .and_modify(|existing: &mut usize| *existing = (*existing).min(limit))
                .or_insert(limit);
        }
        limits
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_from_env(var_name, default.as_secs()).map(Duration::from_secs)
    }
}
