//! Error taxonomy for the embedding and LLM HTTP clients.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned an error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timed out")]
    Timeout,

    #[error("upstream quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("response failed schema validation: {0}")]
    SchemaViolation(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Maps onto the three upstream kinds in `acting_search_core::Error`.
/// Quota errors are distinguished so the orchestrator's retry policy
/// can skip them; quota exhaustion is never retried.
impl From<LlmError> for acting_search_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => acting_search_core::Error::UpstreamTimeout(err.to_string()),
            LlmError::QuotaExceeded(msg) => acting_search_core::Error::UpstreamQuotaExceeded(msg),
            LlmError::Network(_) | LlmError::Api(_) | LlmError::InvalidResponse(_) | LlmError::SchemaViolation(_) => {
                acting_search_core::Error::UpstreamUnavailable(err.to_string())
            }
        }
    }
}
