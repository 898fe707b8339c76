//! HTTP surface: `/search/monologues` and its sibling endpoints, all
//! sharing the same repositories, the same `SearchOrchestrator`, and the
//! same `MonologueResult` response shape.

use axum::extract::{Extension, Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower::timeout::TimeoutLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use acting_search_core::types::{
    AuthenticatedUser, CategoryFilter, Filters, MonologueResult, SearchRequest,
};
use acting_search_core::{Error, Result};

use crate::auth::auth_middleware;
use crate::metrics::metrics_handler;
use crate::rate_limit::demo_rate_limit_middleware;
use crate::state::AppState;
use crate::ApiError;

const MAX_QUERY_CHARS: usize = 500;

/// Assembles the full router: business routes, the shared middleware stack
/// (demo rate limit -> auth -> tracing/compression/CORS), and the ambient
/// health/readiness/metrics endpoints the auth layer treats as public.
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);
    let timeout = std::time::Duration::from_millis(state.settings.server.request_deadline_ms);

    Router::new()
        .route("/search/monologues", get(search_monologues))
        .route("/search/discover", get(search_discover))
        .route("/recommendations", get(recommendations))
        .route("/monologues/:id/similar", get(similar_monologues))
        .route("/monologues/trending", get(trending_monologues))
        .route("/monologues/fresh", get(fresh_monologues))
        .route("/monologues/:id/favorite", post(favorite_monologue))
        .route("/monologues/:id/favorite", delete(unfavorite_monologue))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), demo_rate_limit_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE]);
    }
    let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
}

/// Raw, untyped query params for `/search/monologues` and its siblings,
/// validated and converted into [`Filters`]/[`SearchRequest`] by
/// [`parse_common_params`].
#[derive(Debug, Deserialize, Default)]
struct CommonParams {
    q: Option<String>,
    gender: Option<String>,
    age_range: Option<String>,
    emotion: Option<String>,
    theme: Option<String>,
    difficulty: Option<String>,
    category: Option<String>,
    author: Option<String>,
    act: Option<i32>,
    scene: Option<i32>,
    max_duration: Option<i32>,
    exclude_overdone: Option<bool>,
    limit: Option<u32>,
    page: Option<u32>,
}

fn parse_common_params(params: CommonParams, default_page_size: u32, max_page_size: u32) -> Result<(String, Filters, u32, u32)> {
    let query = params.q.unwrap_or_default();
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(Error::InvalidInput(format!("q must be at most {MAX_QUERY_CHARS} characters")));
    }

    if let Some(act) = params.act {
        if !(1..=10).contains(&act) {
            return Err(Error::InvalidInput("act must be between 1 and 10".to_string()));
        }
    }
    if let Some(scene) = params.scene {
        if !(1..=20).contains(&scene) {
            return Err(Error::InvalidInput("scene must be between 1 and 20".to_string()));
        }
    }
    if let Some(max_duration) = params.max_duration {
        if max_duration <= 0 {
            return Err(Error::InvalidInput("max_duration must be positive".to_string()));
        }
    }

    let page_size = params.limit.unwrap_or(default_page_size);
    if page_size > max_page_size {
        return Err(Error::InvalidInput(format!("limit must be at most {max_page_size}")));
    }
    if page_size == 0 {
        return Err(Error::InvalidInput("limit must be at least 1".to_string()));
    }

    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(Error::InvalidInput("page must be at least 1".to_string()));
    }

    let themes = params
        .theme
        .map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let filters = Filters {
        gender: params.gender,
        age_range: params.age_range,
        emotion: params.emotion,
        themes,
        character_name: None,
        category: params.category.map(CategoryFilter::Single),
        tone: None,
        difficulty: params.difficulty,
        author: params.author,
        act: params.act,
        scene: params.scene,
        max_duration: params.max_duration,
        exclude_overdone: params.exclude_overdone.unwrap_or(false),
    };

    Ok((query, filters, page, page_size))
}

/// `GET /search/monologues`.
async fn search_monologues(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<CommonParams>,
) -> std::result::Result<Json<acting_search_core::types::SearchResponse>, ApiError> {
    let (query, explicit_filters, page, page_size) = parse_common_params(
        params,
        state.settings.limits.default_page_size,
        state.settings.limits.max_page_size,
    )?;

    let req = SearchRequest { query, explicit_filters, page, page_size };
    let response = state.orchestrator.search(&user, req).await?;
    Ok(Json(response))
}

/// `GET /search/discover`: `q=""` browse mode, bypasses the gate entirely.
async fn search_discover(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<CommonParams>,
) -> std::result::Result<Json<acting_search_core::types::SearchResponse>, ApiError> {
    let (_, filters, page, page_size) = parse_common_params(
        params,
        state.settings.limits.default_page_size,
        state.settings.limits.max_page_size,
    )?;
    let response = state.orchestrator.discover(&user, &filters, page, page_size).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ListResponse {
    results: Vec<MonologueResult>,
    total: usize,
}

impl From<Vec<MonologueResult>> for ListResponse {
    fn from(results: Vec<MonologueResult>) -> Self {
        let total = results.len();
        Self { results, total }
    }
}

#[derive(Debug, Deserialize)]
struct RecommendationsParams {
    #[serde(default)]
    fast: bool,
    limit: Option<i64>,
}

/// `GET /recommendations?fast=bool`.
async fn recommendations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<RecommendationsParams>,
) -> std::result::Result<Json<ListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(state.settings.limits.default_page_size as i64);
    let results = state.orchestrator.recommend_for_actor(user.user_id, params.fast, limit).await?;
    Ok(Json(results.into()))
}

#[derive(Debug, Deserialize)]
struct LimitParam {
    limit: Option<i64>,
}

/// `GET /monologues/{id}/similar`.
async fn similar_monologues(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitParam>,
) -> std::result::Result<Json<ListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(state.settings.limits.default_page_size as i64);
    let results = state.orchestrator.similar_to(id, limit).await?;
    Ok(Json(results.into()))
}

/// `GET /monologues/trending`.
async fn trending_monologues(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Query(params): Query<CommonParams>,
) -> std::result::Result<Json<ListResponse>, ApiError> {
    let (_, filters, _, page_size) = parse_common_params(
        params,
        state.settings.limits.default_page_size,
        state.settings.limits.max_page_size,
    )?;
    let results = state.orchestrator.trending(&filters, page_size as i64).await?;
    Ok(Json(results.into()))
}

/// `GET /monologues/fresh`.
async fn fresh_monologues(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Query(params): Query<CommonParams>,
) -> std::result::Result<Json<ListResponse>, ApiError> {
    let (_, filters, _, page_size) = parse_common_params(
        params,
        state.settings.limits.default_page_size,
        state.settings.limits.max_page_size,
    )?;
    let results = state.orchestrator.fresh_picks(&filters, page_size as i64).await?;
    Ok(Json(results.into()))
}

/// `POST /monologues/{id}/favorite`. Idempotent: favoriting twice is a
/// no-op on the second call.
async fn favorite_monologue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> std::result::Result<StatusCode, ApiError> {
    state.orchestrator.favorite(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /monologues/{id}/favorite`. Idempotent: unfavoriting something
/// never favorited is likewise a no-op.
async fn unfavorite_monologue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> std::result::Result<StatusCode, ApiError> {
    state.orchestrator.unfavorite(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" })))
}

/// Verifies the database pool actually answers, not just that the process
/// is up.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("select 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "reason": "database unreachable" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_over_500_chars_is_rejected() {
        let params = CommonParams { q: Some("a".repeat(501)), ..Default::default() };
        let result = parse_common_params(params, 20, 100);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn query_of_exactly_500_chars_is_accepted() {
        let params = CommonParams { q: Some("a".repeat(500)), ..Default::default() };
        assert!(parse_common_params(params, 20, 100).is_ok());
    }

    #[test]
    fn limit_over_max_is_rejected() {
        let params = CommonParams { limit: Some(101), ..Default::default() };
        let result = parse_common_params(params, 20, 100);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn limit_at_max_is_accepted() {
        let params = CommonParams { limit: Some(100), ..Default::default() };
        assert!(parse_common_params(params, 20, 100).is_ok());
    }

    #[test]
    fn act_out_of_range_is_rejected() {
        let params = CommonParams { act: Some(11), ..Default::default() };
        let result = parse_common_params(params, 20, 100);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn theme_param_splits_on_comma() {
        let params = CommonParams { theme: Some("betrayal, power".to_string()), ..Default::default() };
        let (_, filters, _, _) = parse_common_params(params, 20, 100).unwrap();
        assert_eq!(filters.themes, vec!["betrayal".to_string(), "power".to_string()]);
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let (query, filters, page, page_size) = parse_common_params(CommonParams::default(), 20, 100).unwrap();
        assert_eq!(query, "");
        assert_eq!(page, 1);
        assert_eq!(page_size, 20);
        assert!(filters.is_empty());
    }
}
