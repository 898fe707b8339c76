//! Bearer-token authentication: an HTTP-backed [`AuthClient`] plus the
//! `axum` middleware that calls it on every non-public request.

use std::time::Duration;

use acting_search_core::traits::AuthClient;
use acting_search_core::types::AuthenticatedUser;
use acting_search_core::{Error, Result};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

/// Calls the out-of-process authentication collaborator with the caller's
/// bearer token and maps its response onto [`AuthenticatedUser`]. The core
/// never sees or stores a password or session cookie, only this token.
pub struct HttpAuthClient {
    client: reqwest::Client,
    base_url: String,
    service_api_key: Option<String>,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    user_id: uuid::Uuid,
    is_superuser: bool,
    environment: acting_search_core::types::RuntimeEnvironment,
}

impl HttpAuthClient {
    pub fn new(base_url: String, service_api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client builds with static config");
        Self { client, base_url, service_api_key }
    }
}

#[async_trait::async_trait]
impl AuthClient for HttpAuthClient {
    async fn authenticate(&self, bearer_token: &str) -> Result<AuthenticatedUser> {
        let mut request = self
            .client
            .get(format!("{}/v1/authenticate", self.base_url))
            .bearer_auth(bearer_token);
        if let Some(service_key) = &self.service_api_key {
            request = request.header("X-Service-Key", service_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::UpstreamTimeout(e.to_string())
            } else {
                Error::UpstreamUnavailable(e.to_string())
            }
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthenticated);
        }
        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "authentication collaborator returned {}",
                response.status()
            )));
        }

        let parsed: AuthenticateResponse =
            response.json().await.map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        Ok(AuthenticatedUser {
            user_id: parsed.user_id,
            is_superuser: parsed.is_superuser,
            environment: parsed.environment,
        })
    }
}

/// Extracts the bearer token, authenticates it against `state.auth_client`,
/// and inserts the resulting [`AuthenticatedUser`] into the request
/// extensions for handlers to pick up via `Extension<AuthenticatedUser>`.
/// Public paths (health, readiness, metrics) bypass this entirely.
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return (StatusCode::UNAUTHORIZED, "missing bearer token").into_response();
    };

    match state.auth_client.authenticate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(Error::Unauthenticated) => (StatusCode::UNAUTHORIZED, "invalid bearer token").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "authentication collaborator unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "authentication unavailable").into_response()
        }
    }
}
