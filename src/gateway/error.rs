use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
/// Failures of a single upstream inference call.
pub enum GatewayError {
    /// Upstream answered with a non-2xx status.
    #[error("upstream {model} returned status {status}: {body}")]
    UpstreamStatus {
        /// Model id the call was issued for.
        model: String,
        /// HTTP status code.
        status: u16,
        /// Response body text (best effort).
        body: String,
    },

    /// Body was not valid JSON or lacked an expected field.
    #[error("malformed response from {model}: {reason}")]
    MalformedResponse {
        /// Model id the call was issued for.
        model: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// Transport-level failure (connect, TLS, reset, body read).
    #[error("network error calling {model}: {message}")]
    Network {
        /// Model id the call was issued for.
        model: String,
        /// Underlying error text.
        message: String,
    },

    /// The whole-call deadline elapsed.
    #[error("call to {model} timed out after {after:?}")]
    Timeout {
        /// Model id the call was issued for.
        model: String,
        /// Configured deadline.
        after: Duration,
    },
}

impl GatewayError {
    /// Short label used in logs and metrics fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UpstreamStatus { .. } => "upstream_status",
            GatewayError::MalformedResponse { .. } => "malformed_response",
            GatewayError::Network { .. } => "network",
            GatewayError::Timeout { .. } => "timeout",
        }
    }

    /// Model id the failed call targeted.
    pub fn model(&self) -> &str {
        match self {
            GatewayError::UpstreamStatus { model, .. }
            | GatewayError::MalformedResponse { model, .. }
            | GatewayError::Network { model, .. }
            | GatewayError::Timeout { model, .. } => model,
        }
    }

    pub(crate) fn malformed(model: &str, reason: impl Into<String>) -> Self {
        GatewayError::MalformedResponse {
            model: model.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_reqwest(model: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout {
                model: model.to_string(),
                after: timeout,
            }
        } else {
            GatewayError::Network {
                model: model.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Convenience result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
