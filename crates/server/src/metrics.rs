//! Prometheus metrics endpoint: installs the process-wide recorder and
//! renders it at `/metrics`. `rag::cache` emits `cache_requests_total`
//! through the same global recorder this installs.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global metrics recorder and returns the handle `GET
/// /metrics` renders from. Must run once, before any `metrics::counter!`
/// call, so `main` calls this before building the router.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus recorder installs exactly once at startup")
}

pub async fn metrics_handler(axum::extract::State(state): axum::extract::State<crate::state::AppState>) -> impl IntoResponse {
    state.metrics_handle.render()
}
