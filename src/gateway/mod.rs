//! Rate-limited client for the upstream inference server.
//!
//! [`ModelGateway`] speaks the OpenAI-compatible `/chat/completions` and `/embeddings`
//! endpoints. Consumers depend on the [`InferenceBackend`] trait so tests can swap in
//! the mock backend.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod sse;
pub mod streaming;
pub mod types;


pub use backend::InferenceBackend;
pub use client::ModelGateway;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFailure, MockInferenceBackend, synthetic_embedding};
pub use streaming::ChatStream;
pub use types::{ChatMessage, ChatReply, ChatRequest};
