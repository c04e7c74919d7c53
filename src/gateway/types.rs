//! Request and response shapes for the OpenAI-compatible inference API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::streaming::ChatStream;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One chat turn.
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A chat-completion request. Immutable once issued.
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl ChatRequest {
    /// Non-streaming request with temperature `0.7` and `2000` max tokens.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: 2000,
            stream: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Outcome of a successful chat call.
pub enum ChatReply {
    /// Buffered reply: first choice's message content.
    Complete { content: String, latency: Duration },
    /// Lazy fragment stream; `latency` is time to response headers.
    Streaming { stream: ChatStream, latency: Duration },
}

impl ChatReply {
    pub fn latency(&self) -> Duration {
        match self {
            ChatReply::Complete { latency, .. } | ChatReply::Streaming { latency, .. } => *latency,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ChatReply::Streaming { .. })
    }
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Complete { content, latency } => f
                .debug_struct("Complete")
                .field("content_len", &content.len())
                .field("latency", latency)
                .finish(),
            ChatReply::Streaming { latency, .. } => f
                .debug_struct("Streaming")
                .field("latency", latency)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EmbeddingResponse {
    Data { data: Vec<EmbeddingDatum> },
    Flat { embedding: Vec<f32> },
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingDatum {
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    pub fn into_first(self) -> Option<Vec<f32>> {
        match self {
            EmbeddingResponse::Data { data } => data.into_iter().next().map(|d| d.embedding),
            EmbeddingResponse::Flat { embedding } => Some(embedding),
        }
    }
}
