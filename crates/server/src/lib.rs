//! HTTP surface for the acting-material hybrid search engine.
//!
//! Wires the trait seams in `acting_search_core::traits` to concrete
//! collaborators (Postgres/Redis-backed `rag`, HTTP-backed `llm`, an HTTP
//! auth client) and exposes them over `axum`.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod orchestrator;
pub mod rate_limit;
pub mod state;

pub use auth::{auth_middleware, HttpAuthClient};
pub use http::create_router;
pub use metrics::init_metrics;
pub use orchestrator::SearchOrchestrator;
pub use rate_limit::DemoRateLimiter;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Maps the core error taxonomy onto HTTP responses.
/// Every handler returns `Result<_, ApiError>` so the mapping happens in one
/// place instead of being repeated per endpoint.
pub struct ApiError(pub acting_search_core::Error);

impl From<acting_search_core::Error> for ApiError {
    fn from(err: acting_search_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use acting_search_core::Error;

        let (status, body) = match &self.0 {
            Error::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": msg }),
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthenticated", "message": "missing or invalid bearer token" }),
            ),
            Error::QuotaExceeded { feature, limit, used } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": format!("{}_limit_exceeded", feature.usage_field()),
                    "message": "monthly quota exceeded for this feature",
                    "limit": limit,
                    "used": used,
                    "upgrade_url": "https://app.example.com/billing/upgrade",
                }),
            ),
            Error::FeatureNotAvailable { feature } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "feature_not_available",
                    "message": format!("{feature} is not available on your plan"),
                }),
            ),
            Error::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "rate_limited", "message": "too many requests, slow down" }),
            ),
            Error::UpstreamTimeout(msg) | Error::UpstreamQuotaExceeded(msg) | Error::UpstreamUnavailable(msg) => {
                tracing::error!(error = %msg, "both retrieval paths failed, surfacing 503");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "service_unavailable", "message": "search is temporarily unavailable" }),
                )
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error", "message": "an unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
