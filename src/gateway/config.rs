use std::time::Duration;

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS;

#[derive(Debug, Clone)]
/// Connection settings for [`super::ModelGateway`].
pub struct GatewayConfig {
    /// Base URL; `/chat/completions` and `/embeddings` are appended.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Whole-call deadline (request + body read).
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    /// Creates a config for `base_url` with the default deadline.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Sets the whole-call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl From<&Config> for GatewayConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        }
    }
}
