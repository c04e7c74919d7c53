//! Process-wide service wiring.
//!
//! [`ServiceContext`] builds every long-lived service once from a [`Config`] and hands
//! out shared handles. Nothing in the crate reaches for globals.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::cache::{CacheTtls, MemoryStore, ResultCache};
use crate::config::{Config, ConfigError};
use crate::gateway::{GatewayConfig, InferenceBackend, ModelGateway};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::queue::EvaluationQueue;
use crate::ratelimit::RateLimiter;
use crate::similarity::{SimilarityConfig, SimilarityIndex};

#[derive(Debug, Error)]
/// Errors raised while wiring services.
pub enum ContextError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared handles to the limiter, backend, cache, similarity index and orchestrator.
pub struct ServiceContext<B: InferenceBackend = ModelGateway> {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub backend: Arc<B>,
    pub cache: Arc<ResultCache<MemoryStore>>,
    pub index: Arc<SimilarityIndex<B>>,
    pub orchestrator: Arc<Orchestrator<B, MemoryStore>>,
}

impl ServiceContext<ModelGateway> {
    /// Validates `config` and builds the production service graph.
    pub fn from_config(config: &Config) -> Result<Self, ContextError> {
        config.validate()?;

        let limiter = Arc::new(RateLimiter::new(config.rate_limits()));
        let gateway = ModelGateway::new(GatewayConfig::from(config), Arc::clone(&limiter))?;

        info!(
            base_url = %config.base_url,
            chat_model = %config.models.chat,
            coder_model = %config.models.coder,
            embedding_model = %config.models.embedding,
            "Model gateway ready"
        );

        Ok(Self::with_backend(config, limiter, Arc::new(gateway)))
    }
}

impl<B: InferenceBackend + 'static> ServiceContext<B> {
    /// Builds the service graph around an existing backend.
    ///
    /// `limiter` should be the one `backend` acquires from.
    pub fn with_backend(config: &Config, limiter: Arc<RateLimiter>, backend: Arc<B>) -> Self {
        let cache = Arc::new(ResultCache::new(
            MemoryStore::new(config.cache_capacity),
            CacheTtls::from(config),
        ));
        let index = Arc::new(SimilarityIndex::new(
            Arc::clone(&backend),
            SimilarityConfig::from(config),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&backend),
            Arc::clone(&cache),
            Arc::clone(&index),
            OrchestratorConfig::from(config),
        ));

        Self {
            config: config.clone(),
            limiter,
            backend,
            cache,
            index,
            orchestrator,
        }
    }

    /// Spawns an [`EvaluationQueue`] sized by the configured workers and capacity.
    pub fn start_queue(&self) -> EvaluationQueue<B, MemoryStore> {
        EvaluationQueue::start(
            Arc::clone(&self.orchestrator),
            self.config.workers,
            self.config.queue_capacity,
        )
    }
}

impl<B: InferenceBackend> std::fmt::Debug for ServiceContext<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("base_url", &self.config.base_url)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockInferenceBackend;

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = Config {
            base_url: "ftp://models".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            ServiceContext::from_config(&config),
            Err(ContextError::Config(ConfigError::InvalidBaseUrl { .. }))
        ));
    }

    #[tokio::test]
    async fn test_from_config_wires_limits_and_models() {
        let config = Config::default();
        let context = ServiceContext::from_config(&config).unwrap();

        assert_eq!(context.limiter.limit(&config.models.chat), Some(config.chat_limit));
        assert_eq!(
            context.limiter.limit(&config.models.embedding),
            Some(config.embedding_limit)
        );
        assert_eq!(context.orchestrator.config().chat_model, config.models.chat);
        assert_eq!(context.index.config().embedding_model, config.models.embedding);
        assert!(context.index.is_empty());
    }

    #[tokio::test]
    async fn test_services_share_one_cache() {
        let config = Config::default();
        let limiter = Arc::new(RateLimiter::new(config.rate_limits()));
        let context = ServiceContext::with_backend(
            &config,
            Arc::clone(&limiter),
            Arc::new(MockInferenceBackend::new().with_limiter(limiter)),
        );

        context.cache.cache_task("junior", "algorithms", &"cached").await;
        let cached: Option<String> = context
            .orchestrator
            .cache()
            .get_task("junior", "algorithms")
            .await;

        assert_eq!(cached.as_deref(), Some("cached"));
        assert!(Arc::ptr_eq(context.orchestrator.index(), &context.index));
    }

    #[tokio::test]
    async fn test_start_queue_uses_configured_capacity() {
        let config = Config {
            queue_capacity: 3,
            workers: 2,
            ..Default::default()
        };
        let context = ServiceContext::with_backend(
            &config,
            Arc::new(RateLimiter::new(config.rate_limits())),
            Arc::new(MockInferenceBackend::new()),
        );

        let queue = context.start_queue();
        assert_eq!(queue.capacity(), 3);
        queue.shutdown().await;
    }
}
