//! Error types for the citation pipeline
//!
//! Propagation policy:
//! - `Input` and `Cancelled` are run-terminal,
//! - provider failures are isolated per sentence and surfaced as `error`
//!   events (only `RateLimited` is retried),
//! - format failures degrade to documented placeholders and never abort.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures at the scholarly search provider boundary.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider rate limited the request")]
    RateLimited,

    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("provider request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("provider transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed provider response: {message}")]
    Malformed { message: String },
}

impl ProviderError {
    /// Only rate limiting is retried; everything else fails the sentence.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }
}

/// Missing-field failures in the citation formatter. Surfaced for logging;
/// the lenient formatter substitutes placeholders instead of propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatError {
    #[error("style {style} requires field '{field}'")]
    MissingRequiredField { style: String, field: String },
}

/// Application error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {message}")]
    Input { message: String },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("run cancelled")]
    Cancelled,

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    /// Errors that terminate the whole run rather than one sentence.
    pub fn is_run_terminal(&self) -> bool {
        matches!(
            self,
            PipelineError::Input { .. }
                | PipelineError::Cancelled
                | PipelineError::Configuration { .. }
        )
    }

    /// Errors that are contained to a single sentence event.
    pub fn is_sentence_scoped(&self) -> bool {
        matches!(self, PipelineError::Provider(_) | PipelineError::Format(_))
    }

    pub fn input(message: impl Into<String>) -> Self {
        PipelineError::Input {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PipelineError::Internal {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Configuration {
            message: err.to_string(),
        }
    }
}
