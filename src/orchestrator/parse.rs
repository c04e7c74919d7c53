//! Extraction of JSON payloads from free-form model replies.

use serde::de::DeserializeOwned;

use super::error::{BranchKind, OrchestratorError, OrchestratorResult};

const THINK_CLOSE: &str = "</think>";
const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Returns the JSON-looking part of a model reply.
///
/// Drops a leading `<think>` section, then prefers the body of a ```` ```json ````
/// fence, then any fence, then the outermost `{...}` span.
pub fn extract_json(reply: &str) -> &str {
    let mut content = reply.trim();
    if let Some(pos) = content.rfind(THINK_CLOSE) {
        content = content[pos + THINK_CLOSE.len()..].trim();
    }

    if let Some(start) = content.find(JSON_FENCE) {
        let rest = &content[start + JSON_FENCE.len()..];
        let end = rest.find(FENCE).unwrap_or(rest.len());
        return rest[..end].trim();
    }

    if let Some(start) = content.find(FENCE) {
        let rest = &content[start + FENCE.len()..];
        let rest = match rest.find('\n') {
            Some(nl) if rest[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[nl + 1..]
            }
            _ => rest,
        };
        let end = rest.rfind(FENCE).unwrap_or(rest.len());
        return rest[..end].trim();
    }

    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    }
}

/// Parses the JSON payload of `reply` into `T`.
pub fn parse_reply<T: DeserializeOwned>(branch: BranchKind, reply: &str) -> OrchestratorResult<T> {
    serde_json::from_str(extract_json(reply)).map_err(|e| OrchestratorError::InvalidAssessment {
        branch,
        reason: e.to_string(),
    })
}
