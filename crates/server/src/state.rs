//! Shared application state constructed once at startup and cloned cheaply
//! into every request handler, mirroring the workspace's existing
//! `AppState` pattern.

use std::sync::Arc;

use acting_search_config::Settings;
use acting_search_core::traits::{AuthClient, EmbeddingProvider, LlmQueryParser};
use acting_search_persistence::{
    ActorProfileRepository, FavoriteRepository, FilmTvRepository, MonologueRepository,
    TierRepository, UsageRepository, WorkRepository,
};
use acting_search_rag::{CacheHierarchy, CachedEmbedder, Gate, PersistenceTierResolver};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::orchestrator::SearchOrchestrator;
use crate::rate_limit::DemoRateLimiter;

/// All collaborators a request handler might need. Construction happens
/// once in `main`; everything here is either `Clone`-cheap (a pool handle,
/// a repository wrapping a pool) or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pool: PgPool,
    pub monologues: MonologueRepository,
    pub film_tv: FilmTvRepository,
    pub works: WorkRepository,
    pub favorites: FavoriteRepository,
    pub actor_profiles: ActorProfileRepository,
    pub auth_client: Arc<dyn AuthClient>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub metrics_handle: PrometheusHandle,
    pub demo_rate_limiter: Arc<DemoRateLimiter>,
}

impl AppState {
    /// Assembles every repository and collaborator from a live pool plus
    /// the upstream clients the caller has already constructed, then builds
    /// the one `SearchOrchestrator` every handler shares.
    pub fn new(
        settings: Settings,
        pool: PgPool,
        cache: CacheHierarchy,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_parser: Arc<dyn LlmQueryParser>,
        auth_client: Arc<dyn AuthClient>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let settings = Arc::new(settings);
        let cache = Arc::new(cache);

        let monologues = MonologueRepository::new(pool.clone());
        let film_tv = FilmTvRepository::new(pool.clone());
        let works = WorkRepository::new(pool.clone());
        let favorites = FavoriteRepository::new(pool.clone());
        let actor_profiles = ActorProfileRepository::new(pool.clone());
        let tiers = TierRepository::new(pool.clone());
        let usage = UsageRepository::new(pool.clone());

        let resolver = Arc::new(PersistenceTierResolver::new(tiers));
        let gate = Arc::new(Gate::new(resolver, usage));
        let embedder = Arc::new(CachedEmbedder::new(embedding_provider, cache.clone()));

        let orchestrator = Arc::new(SearchOrchestrator::new(
            monologues.clone(),
            works.clone(),
            favorites.clone(),
            actor_profiles.clone(),
            cache,
            gate,
            embedder,
            llm_parser,
            settings.limits.default_page_size,
            settings.limits.max_candidates,
            settings.limits.best_match_threshold,
        ));

        Self {
            settings,
            pool,
            monologues,
            film_tv,
            works,
            favorites,
            actor_profiles,
            auth_client,
            orchestrator,
            metrics_handle,
            demo_rate_limiter: Arc::new(DemoRateLimiter::new()),
        }
    }
}
