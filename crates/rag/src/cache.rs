//! Four-level cache hierarchy: L0 in-process LRU, L1 Redis, L2 the
//! persistent vector column (document embeddings only; see
//! `acting_search_persistence::MonologueRepository::dense_search`), cold
//! generate as the final fallback.
//!
//! Every layer is best-effort: a failure at L0 or L1 falls through to the
//! next layer rather than failing the request.

use std::num::NonZeroUsize;
use std::sync::Arc;

use acting_search_core::traits::KeyValueCache;
use acting_search_core::types::{Filters, MatchType};
use data_encoding::HEXLOWER;
use lru::LruCache;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const L0_CAPACITY: usize = 1_000;

const TTL_PARSED_FILTERS: u64 = 24 * 3_600;
const TTL_EMBEDDING: u64 = 7 * 24 * 3_600;
const TTL_EMBEDDING_WARMED: u64 = 30 * 24 * 3_600;
const TTL_SEARCH_RESULTS: u64 = 3_600;

#[derive(Serialize)]
struct CacheKeyInput<'a> {
    query: &'a str,
    filters: Vec<(&'static str, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
}

/// MD5 hexdigest over a canonical JSON of `{query, sorted filter pairs,
/// user_id}`, prefixed per layer so the same hash never collides across
/// layer semantics.
fn cache_key(prefix: &str, query: &str, filters: &Filters, user_id_for_results_only: Option<Uuid>) -> String {
    let normalized_query = query.trim().to_lowercase();
    let input = CacheKeyInput {
        query: &normalized_query,
        filters: filters.sorted_pairs(),
        user_id: user_id_for_results_only,
    };
    let canonical = serde_json::to_vec(&input).expect("cache key input always serializes");
    let mut hasher = Md5::new();
    hasher.update(&canonical);
    format!("{prefix}:{}", HEXLOWER.encode(&hasher.finalize()))
}

/// One ranked row's id plus the score/attribution the rank merger assigned
/// it, cached alongside the id so a cache hit can replay the exact same
/// response the original search produced instead of recomputing a
/// placeholder.
#[derive(Clone, Serialize, Deserialize)]
pub struct CachedResult {
    pub id: Uuid,
    pub score: f32,
    pub match_type: MatchType,
}

/// A full ranked result set, cached under the query+filters+user key so a
/// repeated query reproduces the exact same page `search` returned the first
/// time, `best_match_id` included.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct CachedResults {
    pub results: Vec<CachedResult>,
    pub best_match_id: Option<Uuid>,
}

struct L0Maps {
    parsed_filters: LruCache<String, Filters>,
    embeddings: LruCache<String, Vec<f32>>,
    search_results: LruCache<String, CachedResults>,
}

/// In-process LRU, bounded to 1,000 entries per map, guarded by an internal
/// lock.
pub struct L0Cache {
    maps: Mutex<L0Maps>,
}

impl Default for L0Cache {
    fn default() -> Self {
        let cap = NonZeroUsize::new(L0_CAPACITY).unwrap();
        Self {
            maps: Mutex::new(L0Maps {
                parsed_filters: LruCache::new(cap),
                embeddings: LruCache::new(cap),
                search_results: LruCache::new(cap),
            }),
        }
    }
}

/// The Redis-backed L1 layer, behind the `KeyValueCache` seam the core
/// defines so the orchestrator never has to know whether it is talking to
/// Redis or a stub.
pub struct RedisCache {
    manager: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager })
    }
}

#[async_trait::async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> acting_search_core::Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        redis::AsyncCommands::get::<_, Option<Vec<u8>>>(&mut conn, key)
            .await
            .map_err(|e| acting_search_core::Error::Internal(e.to_string()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> acting_search_core::Result<()> {
        let mut conn = self.manager.clone();
        redis::AsyncCommands::set_ex::<_, _, ()>(&mut conn, key, value, ttl_seconds)
            .await
            .map_err(|e| acting_search_core::Error::Internal(e.to_string()))
    }
}

/// The orchestrator's single entry point into the cache hierarchy. Holds L0
/// unconditionally and an optional L1 (absent when `REDIS_ENABLED=false`).
pub struct CacheHierarchy {
    l0: L0Cache,
    l1: Option<Arc<dyn KeyValueCache>>,
}

impl CacheHierarchy {
    pub fn new(l1: Option<Arc<dyn KeyValueCache>>) -> Self {
        Self { l0: L0Cache::default(), l1 }
    }

    pub fn without_redis() -> Self {
        Self::new(None)
    }

    pub async fn get_filters(&self, query: &str) -> Option<Filters> {
        let key = cache_key("filters", query, &Filters::default(), None);
        if let Some(hit) = self.l0.maps.lock().parsed_filters.get(&key).cloned() {
            metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "filters", "result" => "hit").increment(1);
            return Some(hit);
        }
        if let Some(l1) = &self.l1 {
            if let Ok(Some(bytes)) = l1.get(&key).await {
                if let Ok(filters) = serde_json::from_slice::<Filters>(&bytes) {
                    metrics::counter!("cache_requests_total", "layer" => "l1", "map" => "filters", "result" => "hit").increment(1);
                    self.l0.maps.lock().parsed_filters.put(key, filters.clone());
                    return Some(filters);
                }
            }
        }
        metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "filters", "result" => "miss").increment(1);
        None
    }

    pub async fn set_filters(&self, query: &str, filters: &Filters) {
        let key = cache_key("filters", query, &Filters::default(), None);
        self.l0.maps.lock().parsed_filters.put(key.clone(), filters.clone());
        if let Some(l1) = &self.l1 {
            if let Ok(bytes) = serde_json::to_vec(filters) {
                let _ = l1.set(&key, &bytes, TTL_PARSED_FILTERS).await;
            }
        }
    }

    /// Query-side embedding cache only; document embeddings live in the
    /// persistent vector column (L2), which this hierarchy never touches.
    pub async fn get_embedding(&self, query: &str) -> Option<Vec<f32>> {
        let key = cache_key("embedding", query, &Filters::default(), None);
        if let Some(hit) = self.l0.maps.lock().embeddings.get(&key).cloned() {
            metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "embeddings", "result" => "hit").increment(1);
            return Some(hit);
        }
        if let Some(l1) = &self.l1 {
            if let Ok(Some(bytes)) = l1.get(&key).await {
                if let Ok(vector) = serde_json::from_slice::<Vec<f32>>(&bytes) {
                    metrics::counter!("cache_requests_total", "layer" => "l1", "map" => "embeddings", "result" => "hit").increment(1);
                    self.l0.maps.lock().embeddings.put(key, vector.clone());
                    return Some(vector);
                }
            }
        }
        metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "embeddings", "result" => "miss").increment(1);
        None
    }

    pub async fn set_embedding(&self, query: &str, vector: &[f32], warmed: bool) {
        let key = cache_key("embedding", query, &Filters::default(), None);
        self.l0.maps.lock().embeddings.put(key.clone(), vector.to_vec());
        if let Some(l1) = &self.l1 {
            if let Ok(bytes) = serde_json::to_vec(vector) {
                let ttl = if warmed { TTL_EMBEDDING_WARMED } else { TTL_EMBEDDING };
                let _ = l1.set(&key, &bytes, ttl).await;
            }
        }
    }

    pub async fn get_results(&self, query: &str, filters: &Filters, user_id: Uuid) -> Option<CachedResults> {
        let key = cache_key("results", query, filters, Some(user_id));
        if let Some(hit) = self.l0.maps.lock().search_results.get(&key).cloned() {
            metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "results", "result" => "hit").increment(1);
            return Some(hit);
        }
        if let Some(l1) = &self.l1 {
            if let Ok(Some(bytes)) = l1.get(&key).await {
                if let Ok(cached) = serde_json::from_slice::<CachedResults>(&bytes) {
                    metrics::counter!("cache_requests_total", "layer" => "l1", "map" => "results", "result" => "hit").increment(1);
                    self.l0.maps.lock().search_results.put(key, cached.clone());
                    return Some(cached);
                }
            }
        }
        metrics::counter!("cache_requests_total", "layer" => "l0", "map" => "results", "result" => "miss").increment(1);
        None
    }

    pub async fn set_results(&self, query: &str, filters: &Filters, user_id: Uuid, results: &CachedResults) {
        let key = cache_key("results", query, filters, Some(user_id));
        self.l0.maps.lock().search_results.put(key.clone(), results.clone());
        if let Some(l1) = &self.l1 {
            if let Ok(bytes) = serde_json::to_vec(results) {
                let _ = l1.set(&key, &bytes, TTL_SEARCH_RESULTS).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn l0_round_trips_filters() {
        let cache = CacheHierarchy::without_redis();
        let filters = Filters { emotion: Some("sadness".to_string()), ..Default::default() };
        cache.set_filters("sad monologue", &filters).await;
        let got = cache.get_filters("sad monologue").await;
        assert_eq!(got, Some(filters));
    }

    #[tokio::test]
    async fn l0_round_trips_embeddings() {
        let cache = CacheHierarchy::without_redis();
        let vector = vec![0.1f32; 3072];
        cache.set_embedding("hamlet act 3 scene 1", &vector, false).await;
        assert_eq!(cache.get_embedding("hamlet act 3 scene 1").await, Some(vector));
    }

    #[tokio::test]
    async fn cache_key_is_stable_across_filter_field_order() {
        let a = Filters { gender: Some("female".to_string()), emotion: Some("sadness".to_string()), ..Default::default() };
        let key_a = cache_key("results", "q", &a, None);
        let key_b = cache_key("results", "q", &a, None);
        assert_eq!(key_a, key_b);
    }

    #[tokio::test]
    async fn miss_on_unrelated_key() {
        let cache = CacheHierarchy::without_redis();
        assert_eq!(cache.get_filters("never set").await, None);
    }
}
