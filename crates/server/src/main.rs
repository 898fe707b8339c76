//! Acting-material search engine server entry point.
//!
//! Loads settings, connects Postgres and (optionally) Redis, constructs the
//! upstream embedding/LLM/auth collaborators over HTTP, assembles the one
//! `AppState`/`SearchOrchestrator` every handler shares, and serves the
//! `axum` router with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use acting_search_config::{load_settings, Settings};
use acting_search_core::traits::{AuthClient, EmbeddingProvider, LlmQueryParser};
use acting_search_llm::{EmbeddingConfig, HttpEmbeddingProvider, HttpQueryParser, QueryParserConfig};
use acting_search_rag::CacheHierarchy;
use acting_search_server::{create_router, init_metrics, AppState, HttpAuthClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = std::env::var("ACTING_SEARCH_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let settings = match load_settings(&config_dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: failed to load configuration from {config_dir}: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(
        environment = ?settings.environment,
        "starting acting-material search server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let metrics_handle = init_metrics();

    let pool = acting_search_persistence::connect(&settings.database.database_url, settings.database.max_connections)
        .await?;

    let cache = if settings.redis.redis_enabled {
        match acting_search_rag::RedisCache::connect(&settings.redis.redis_url).await {
            Ok(redis) => {
                tracing::info!("connected to redis, L1 cache enabled");
                CacheHierarchy::new(Some(Arc::new(redis)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to redis, running L0-only");
                CacheHierarchy::without_redis()
            }
        }
    } else {
        tracing::info!("redis disabled by configuration, running L0-only");
        CacheHierarchy::without_redis()
    };

    let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingProvider::new(EmbeddingConfig {
        api_base: settings.upstream.embedding_api_base.clone(),
        api_key: settings.upstream.embedding_api_key.clone(),
        dimensions: settings.upstream.embedding_dims,
        ..Default::default()
    }));

    let llm_parser: Arc<dyn LlmQueryParser> = Arc::new(HttpQueryParser::new(QueryParserConfig {
        api_base: settings.upstream.llm_api_base.clone(),
        api_key: settings.upstream.llm_api_key.clone(),
        model: settings.upstream.llm_model.clone(),
        ..Default::default()
    }));

    let auth_client: Arc<dyn AuthClient> =
        Arc::new(HttpAuthClient::new(settings.auth.auth_api_base.clone(), settings.auth.auth_api_key.clone()));

    let state = AppState::new(settings.clone(), pool, cache, embedding_provider, llm_parser, auth_client, metrics_handle);

    let app = create_router(state);

    let addr: SocketAddr = settings.server.bind_addr.parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }

    // Give in-flight requests a moment to finish within the request budget
    // rather than cutting them off at the instant the signal arrives.
    tokio::time::sleep(Duration::from_millis(250)).await;
}

fn init_tracing(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "acting_search=info,tower_http=info".into());
    let fmt_layer = if matches!(settings.environment, acting_search_config::RuntimeEnvironment::Prod) {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}
