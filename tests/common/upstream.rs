//! Wiremock responders for the OpenAI-compatible inference API.

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{AUTHENTICITY_JSON, CHAT_MODEL, CODER_MODEL, EMBED_MODEL, QUALITY_JSON};

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"index": 0, "delta": {"content": fragment}}]})
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Answers non-streaming chat calls for `model` with `content`.
pub async fn mount_completion(server: &MockServer, model: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": model, "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Fails every chat call for `model` with `status`.
pub async fn mount_failure(server: &MockServer, model: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}

/// Streams `fragments` for streaming chat calls to the chat model.
pub async fn mount_stream(server: &MockServer, fragments: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": CHAT_MODEL, "stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(fragments)),
        )
        .mount(server)
        .await;
}

/// Returns `embedding` for every embedding call.
pub async fn mount_embedding(server: &MockServer, embedding: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"model": EMBED_MODEL})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": embedding}]
        })))
        .mount(server)
        .await;
}

/// Quality, authenticity and embedding responders for a full evaluation.
pub async fn mount_evaluation(server: &MockServer) {
    mount_completion(server, CHAT_MODEL, QUALITY_JSON).await;
    mount_completion(server, CODER_MODEL, AUTHENTICITY_JSON).await;
    mount_embedding(server, &[1.0, 0.0]).await;
}

/// Number of requests the server received on `route`.
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
