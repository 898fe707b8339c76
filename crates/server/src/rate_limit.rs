//! Per-IP demo rate limiter, independent of the per-user quota `Gate` in
//! `acting_search_rag::gate`.
//! Guards anonymous/demo traffic bursts before auth or any expensive work
//! runs; a user who is correctly authenticated and under quota can still be
//! throttled here if their IP is noisy.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::state::AppState;

/// Requests allowed per IP within `Settings::limits.demo_rate_limit_window_sec`.
/// The window itself is a named config option; the count is this
/// crate's judgment call, sized for a few interactive searches per window
/// rather than a sustained crawl.
const MAX_REQUESTS_PER_WINDOW: u32 = 60;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Sliding-ish per-IP window counter: each IP's window resets the first time
/// it is checked after the configured duration has elapsed.
#[derive(Default)]
pub struct DemoRateLimiter {
    windows: DashMap<IpAddr, Window>,
}

impl DemoRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn allow(&self, ip: IpAddr, window: Duration) -> bool {
        let mut entry = self
            .windows
            .entry(ip)
            .or_insert_with(|| Window { started_at: Instant::now(), count: 0 });
        if entry.started_at.elapsed() > window {
            entry.started_at = Instant::now();
            entry.count = 0;
        }
        entry.count += 1;
        entry.count <= MAX_REQUESTS_PER_WINDOW
    }
}

/// Applied ahead of auth so a flood of requests never reaches the bearer
/// token check, let alone the orchestrator.
pub async fn demo_rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let window = Duration::from_secs(state.settings.limits.demo_rate_limit_window_sec);
    if !state.demo_rate_limiter.allow(addr.ip(), window) {
        return (StatusCode::TOO_MANY_REQUESTS, "too many requests, slow down").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let limiter = DemoRateLimiter::new();
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let window = Duration::from_secs(60);
        for _ in 0..MAX_REQUESTS_PER_WINDOW {
            assert!(limiter.allow(ip, window));
        }
        assert!(!limiter.allow(ip, window));
    }

    #[test]
    fn distinct_ips_have_independent_windows() {
        let limiter = DemoRateLimiter::new();
        let window = Duration::from_secs(60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        for _ in 0..MAX_REQUESTS_PER_WINDOW {
            assert!(limiter.allow(a, window));
        }
        assert!(limiter.allow(b, window));
    }
}
