//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Base URL does not use an HTTP scheme.
    #[error("invalid base url '{value}': expected http:// or https://")]
    InvalidBaseUrl { value: String },

    /// A setting that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    /// Similarity threshold outside `[0, 1]`.
    #[error("similarity threshold {value} is outside [0, 1]")]
    ThresholdOutOfRange { value: f32 },

    /// A model id was empty.
    #[error("model id for {role} is empty")]
    EmptyModelId { role: &'static str },
}
