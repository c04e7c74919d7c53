use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, instrument};

use super::backend::InferenceBackend;
use super::config::GatewayConfig;
use super::error::{GatewayError, GatewayResult};
use super::streaming::ChatStream;
use super::types::{
    ChatCompletionResponse, ChatReply, ChatRequest, EmbeddingRequest, EmbeddingResponse,
};
use crate::ratelimit::RateLimiter;

const CHAT_PATH: &str = "chat/completions";
const EMBEDDINGS_PATH: &str = "embeddings";

/// HTTP client for an OpenAI-compatible inference server.
///
/// Every call waits on the shared [`RateLimiter`] before any network I/O, and the
/// configured deadline starts once the slot is granted.
#[derive(Debug, Clone)]
pub struct ModelGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl ModelGateway {
    /// Builds a gateway with a fresh connection pool.
    ///
    /// Fails only if the HTTP client's TLS backend cannot be initialised.
    pub fn new(config: GatewayConfig, limiter: Arc<RateLimiter>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, config, limiter))
    }

    /// Builds a gateway around an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        config: GatewayConfig,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            http,
            config,
            limiter,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Issues a chat-completion call.
    ///
    /// With `request.stream` set, returns as soon as response headers arrive; the
    /// remaining deadline then applies to reading the stream.
    #[instrument(skip(self, request), fields(model = %request.model, stream = request.stream))]
    pub async fn chat_completion(&self, request: ChatRequest) -> GatewayResult<ChatReply> {
        self.limiter.acquire(&request.model).await;

        let model = request.model.as_str();
        let started = Instant::now();
        let deadline = started + self.config.timeout;

        if request.stream {
            let response = self
                .within(model, deadline, self.post(model, CHAT_PATH, &request))
                .await?;
            let latency = started.elapsed();
            debug!(latency_ms = latency.as_millis() as u64, "Stream opened");

            let stream = ChatStream::from_byte_stream(
                model.to_string(),
                response.bytes_stream(),
                deadline,
                self.config.timeout,
            );
            return Ok(ChatReply::Streaming { stream, latency });
        }

        let body: ChatCompletionResponse = self
            .within(model, deadline, async {
                let response = self.post(model, CHAT_PATH, &request).await?;
                self.read_json(model, response).await
            })
            .await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::malformed(model, "response has no choices"))?
            .message
            .content
            .ok_or_else(|| GatewayError::malformed(model, "first choice has no content"))?;

        let latency = started.elapsed();
        debug!(
            latency_ms = latency.as_millis() as u64,
            chars = content.len(),
            "Completion received"
        );
        Ok(ChatReply::Complete { content, latency })
    }

    /// Non-streaming call returning the reply text.
    pub async fn complete(&self, request: ChatRequest) -> GatewayResult<String> {
        match self.chat_completion(request.streaming(false)).await? {
            ChatReply::Complete { content, .. } => Ok(content),
            ChatReply::Streaming { stream, .. } => stream.collect_text().await,
        }
    }

    /// Streaming call returning the fragment stream.
    pub async fn stream(&self, request: ChatRequest) -> GatewayResult<ChatStream> {
        match self.chat_completion(request.streaming(true)).await? {
            ChatReply::Streaming { stream, .. } => Ok(stream),
            ChatReply::Complete { content, .. } => {
                Ok(ChatStream::from_fragments(vec![Ok(content)]))
            }
        }
    }

    /// Returns the embedding vector for `text`.
    #[instrument(skip(self, text), fields(model = %model, text_len = text.len()))]
    pub async fn embed(&self, model: &str, text: &str) -> GatewayResult<Vec<f32>> {
        self.limiter.acquire(model).await;

        let deadline = Instant::now() + self.config.timeout;
        let request = EmbeddingRequest { model, input: text };

        let body: EmbeddingResponse = self
            .within(model, deadline, async {
                let response = self.post(model, EMBEDDINGS_PATH, &request).await?;
                self.read_json(model, response).await
            })
            .await?;

        let embedding = body
            .into_first()
            .ok_or_else(|| GatewayError::malformed(model, "response has no embedding"))?;
        if embedding.is_empty() {
            return Err(GatewayError::malformed(model, "embedding vector is empty"));
        }

        debug!(dimension = embedding.len(), "Embedding received");
        Ok(embedding)
    }

    async fn within<T>(
        &self,
        model: &str,
        deadline: Instant,
        call: impl std::future::Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        match timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    model,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Upstream call timed out"
                );
                Err(GatewayError::Timeout {
                    model: model.to_string(),
                    after: self.config.timeout,
                })
            }
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        model: &str,
        path: &str,
        body: &T,
    ) -> GatewayResult<reqwest::Response> {
        let mut request = self.http.post(self.config.endpoint(path)).json(body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(model, self.config.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model, status = status.as_u16(), %body, "Upstream returned error status");
            return Err(GatewayError::UpstreamStatus {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        model: &str,
        response: reqwest::Response,
    ) -> GatewayResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(model, self.config.timeout, e))?;

        serde_json::from_slice(&bytes).map_err(|e| GatewayError::malformed(model, e.to_string()))
    }
}

impl InferenceBackend for ModelGateway {
    async fn chat(&self, request: ChatRequest) -> GatewayResult<ChatReply> {
        self.chat_completion(request).await
    }

    async fn embed(&self, model: &str, text: &str) -> GatewayResult<Vec<f32>> {
        ModelGateway::embed(self, model, text).await
    }
}
