//! Error taxonomy for the search engine.
//!
//! Every crate-local error type converts into this one at its public boundary,
//! mirroring the `thiserror`-based conversion pattern used throughout the
//! workspace (see `acting-search-rag::RagError`, `acting-search-llm::LlmError`).
//! The HTTP layer maps each variant to a status code; this crate stays free of
//! any HTTP-framework dependency so it can be used from persistence and rag
//! alike.

use thiserror::Error;

use crate::types::Feature;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("quota exceeded for {feature}: {used}/{limit}")]
    QuotaExceeded {
        feature: Feature,
        limit: i32,
        used: i32,
    },

    #[error("feature not available: {feature}")]
    FeatureNotAvailable { feature: Feature },

    #[error("rate limited")]
    RateLimited,

    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("upstream quota exceeded: {0}")]
    UpstreamQuotaExceeded(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the three upstream kinds that the orchestrator recovers from
    /// locally; only surfaced to the caller if every retrieval path is
    /// exhausted.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamTimeout(_) | Error::UpstreamQuotaExceeded(_) | Error::UpstreamUnavailable(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Error::UpstreamTimeout(err.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed => Error::UpstreamUnavailable(err.to_string()),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Shorthand used throughout the workspace, mirroring `acting-search-rag`
/// and `acting-search-llm`'s local `Result` aliases.
pub type Result<T> = std::result::Result<T, Error>;
