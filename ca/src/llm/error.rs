//! LLM client errors

use std::time::Duration;
use thiserror::Error;

/// Errors from talking to a model provider
///
/// A completion failure is fatal to the current agent turn; tool failures
/// never surface here (they become tool result envelopes instead).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether this error is a rate limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether the caller could usefully retry the request
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Network(_) => true,
            Self::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            Self::InvalidResponse(_) => false,
        }
    }

    /// Suggested wait before retrying, when the provider supplied one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
