use super::error::GatewayResult;
use super::types::{ChatReply, ChatRequest};

/// Upstream inference operations the evaluation pipeline depends on.
///
/// Implemented by [`super::ModelGateway`] for real traffic and by the mock backend in
/// tests.
pub trait InferenceBackend: Send + Sync {
    /// Issues one chat-completion call.
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl std::future::Future<Output = GatewayResult<ChatReply>> + Send;

    /// Embeds `text` with `model`.
    fn embed(
        &self,
        model: &str,
        text: &str,
    ) -> impl std::future::Future<Output = GatewayResult<Vec<f32>>> + Send;

    /// Issues a non-streaming call and returns the reply text.
    ///
    /// A backend that answers with a stream anyway is drained into one string.
    fn complete(
        &self,
        request: ChatRequest,
    ) -> impl std::future::Future<Output = GatewayResult<String>> + Send {
        async move {
            match self.chat(request.streaming(false)).await? {
                ChatReply::Complete { content, .. } => Ok(content),
                ChatReply::Streaming { stream, .. } => stream.collect_text().await,
            }
        }
    }
}
