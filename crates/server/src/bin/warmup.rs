//! Offline cache-warmup job: pre-populates the L1 embedding cache for a
//! fixed list of common queries at the 30-day "warmed" TTL, so the first
//! real user hitting one of these queries gets an L1 hit instead of a cold
//! embedding call. Skips queries already cached, logs progress, and keeps
//! going past a single query's failure.
//!
//! Invoked as an operational script, never from the HTTP surface:
//! `cargo run --bin warmup`.

use std::sync::Arc;
use std::time::Duration;

use acting_search_config::load_settings;
use acting_search_core::traits::EmbeddingProvider;
use acting_search_core::types::Filters;
use acting_search_llm::{EmbeddingConfig, HttpEmbeddingProvider};
use acting_search_rag::CacheHierarchy;

/// Representative high-traffic queries worth pre-warming. In a real
/// deployment this list would be sourced from query logs; it is a fixed
/// seed here since this crate has no query-log ingestion of its own.
const COMMON_QUERIES: &[&str] = &[
    "sad monologue for a young woman",
    "comedic monologue for a man in his 20s",
    "shakespeare monologue about betrayal",
    "contemporary monologue about grief",
    "short monologue for an audition",
    "angry monologue for a teenager",
    "monologue about unrequited love",
    "dramatic monologue for an older man",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config_dir = std::env::var("ACTING_SEARCH_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let settings = load_settings(&config_dir)?;

    if !settings.redis.redis_enabled {
        tracing::warn!("redis not enabled, skipping cache warmup");
        return Ok(());
    }

    let redis = acting_search_rag::RedisCache::connect(&settings.redis.redis_url).await?;
    let cache = Arc::new(CacheHierarchy::new(Some(Arc::new(redis))));

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingProvider::new(EmbeddingConfig {
        api_base: settings.upstream.embedding_api_base.clone(),
        api_key: settings.upstream.embedding_api_key.clone(),
        dimensions: settings.upstream.embedding_dims,
        ..Default::default()
    }));

    tracing::info!(count = COMMON_QUERIES.len(), "warming up cache");

    for (i, &query) in COMMON_QUERIES.iter().enumerate() {
        let normalized = query.trim().to_lowercase();

        if cache.get_embedding(&normalized).await.is_some() {
            tracing::debug!(query = normalized, "already cached, skipping");
            continue;
        }

        let text = acting_search_rag::query_enriched_text(&normalized, &Filters::default());
        match embedder.embed(&text).await {
            Ok(vector) => {
                cache.set_embedding(&normalized, &vector, true).await;
                tracing::info!(i = i + 1, total = COMMON_QUERIES.len(), query = normalized, "cached");
            }
            Err(e) => {
                tracing::warn!(query = normalized, error = %e, "failed to warm query, continuing");
            }
        }

        // Stay well under the embedder's per-second rate limit.
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tracing::info!("cache warmup complete");
    Ok(())
}
