//! The Search Orchestrator plus its sibling
//! supplement operations: discover, recommend-for-actor,
//! similar-to-this-monologue, trending, fresh picks, and favorite toggling.
//! All of them reuse the same repositories and the Rank Merger rather than
//! introducing a parallel code path.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use acting_search_core::traits::LlmQueryParser;
use acting_search_core::types::{
    AuthenticatedUser, Feature, FavoriteTarget, Filters, GateDecision, GateDenialReason,
    MatchType, MonologueResult, QueryTier, SearchRequest, SearchResponse,
};
use acting_search_core::{Error, Result};
use acting_search_persistence::{
    ActorProfileRepository, FavoriteRepository, MonologueRepository, ScoredMonologue,
    WorkRepository,
};
use acting_search_rag::{
    classify, correct, extract, merge, CacheHierarchy, CachedEmbedder, CachedResult, CachedResults, Gate,
};
use uuid::Uuid;

/// Below this confidence, keyword extraction is considered too weak to
/// trust and the query is escalated to the LLM parser.
const KEYWORD_CONFIDENCE_UPGRADE_THRESHOLD: f32 = 0.5;

pub struct SearchOrchestrator {
    monologues: MonologueRepository,
    works: WorkRepository,
    favorites: FavoriteRepository,
    actor_profiles: ActorProfileRepository,
    cache: Arc<CacheHierarchy>,
    gate: Arc<Gate>,
    embedder: Arc<CachedEmbedder>,
    llm_parser: Arc<dyn LlmQueryParser>,
    default_page_size: u32,
    max_candidates: usize,
    best_match_threshold: f32,
}

impl SearchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        monologues: MonologueRepository,
        works: WorkRepository,
        favorites: FavoriteRepository,
        actor_profiles: ActorProfileRepository,
        cache: Arc<CacheHierarchy>,
        gate: Arc<Gate>,
        embedder: Arc<CachedEmbedder>,
        llm_parser: Arc<dyn LlmQueryParser>,
        default_page_size: u32,
        max_candidates: usize,
        best_match_threshold: f32,
    ) -> Self {
        Self {
            monologues,
            works,
            favorites,
            actor_profiles,
            cache,
            gate,
            embedder,
            llm_parser,
            default_page_size,
            max_candidates,
            best_match_threshold,
        }
    }

    /// Gate check, typo correction, classification, filter extraction,
    /// cache lookup, retrieval, ranking, and pagination, in that order.
    pub async fn search(&self, user: &AuthenticatedUser, req: SearchRequest) -> Result<SearchResponse> {
        let page = req.page.max(1);
        let page_size = if req.page_size == 0 { self.default_page_size } else { req.page_size };

        if req.query.trim().is_empty() {
            return self.discover(user, &req.explicit_filters, page, page_size).await;
        }

        self.gate_allow(user, Feature::AiSearch).await?;

        let correction = correct(&req.query);
        let normalized = correction.corrected_query;

        let mut tier = classify(&normalized);
        let extraction = extract(&normalized);
        if tier == QueryTier::Tier2 && extraction.confidence < KEYWORD_CONFIDENCE_UPGRADE_THRESHOLD {
            tier = QueryTier::Tier3;
        }

        let filters_ai = if tier == QueryTier::Tier3 && req.explicit_filters.is_empty() {
            self.llm_parser.parse(&normalized).await.unwrap_or_default()
        } else {
            Filters::default()
        };

        let filters = filters_ai.merge_onto(extraction.filters).merge_onto(req.explicit_filters.clone());

        if let Some(cached) = self.cache.get_results(&normalized, &filters, user.user_id).await {
            return self.hydrate_cached_page(&cached, page, page_size).await;
        }

        let (results, total, best_match_id, all_results) = self
            .search_uncached(&normalized, &filters, user, page, page_size)
            .await?;

        let cached = CachedResults {
            results: all_results
                .iter()
                .map(|r| CachedResult { id: r.id, score: r.relevance_score, match_type: r.match_type })
                .collect(),
            best_match_id,
        };
        self.cache.set_results(&normalized, &filters, user.user_id, &cached).await;

        Ok(SearchResponse {
            results,
            total,
            page,
            page_size,
            corrected_query: correction.show_banner.then_some(normalized),
            best_match_id,
        })
    }

    async fn search_uncached(
        &self,
        normalized: &str,
        filters: &Filters,
        user: &AuthenticatedUser,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<MonologueResult>, i64, Option<Uuid>, Vec<MonologueResult>)> {
        let embed_result = self.embedder.embed_query(normalized, filters).await;
        if let Err(e) = &embed_result {
            tracing::warn!(error = %e, "embedding failed, falling back to lexical-only");
        }

        let dense_limit = self.max_candidates as i64;
        let lexical_limit = (page_size as i64) * 2;

        let (dense, lexical) = tokio::join!(
            async {
                match &embed_result {
                    Ok(embedding) => match self.monologues.dense_search(embedding, filters, dense_limit).await {
                        Ok(rows) => Some(rows),
                        Err(e) => {
                            tracing::warn!(error = %e, "dense retrieval failed, falling back to lexical");
                            None
                        }
                    },
                    Err(_) => None,
                }
            },
            self.monologues.lexical_search(normalized, filters, lexical_limit)
        );

        let dense_rows = dense.unwrap_or_default();
        let lexical_rows = match lexical {
            Ok(rows) => rows,
            Err(e) => {
                if dense_rows.is_empty() && embed_result.is_err() {
                    tracing::error!(error = %e, "both retrieval paths failed");
                    return Err(Error::UpstreamUnavailable("both retrievers failed".to_string()));
                }
                tracing::warn!(error = %e, "lexical retrieval failed, continuing dense-only");
                Vec::new()
            }
        };

        let work_ids: HashSet<Uuid> = dense_rows
            .iter()
            .chain(lexical_rows.iter())
            .map(|s: &ScoredMonologue| s.monologue.work_id)
            .collect();
        let works_by_id = self.works.get_by_ids(&work_ids.into_iter().collect::<Vec<_>>()).await?;

        let bookmarked_ids: HashSet<Uuid> = self
            .favorites
            .bookmarked_monologue_ids(user.user_id)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();
        let profile = self.actor_profiles.get(user.user_id).await.unwrap_or(None);

        let (all_results, total, best_match_id) = merge(
            dense_rows,
            lexical_rows,
            normalized,
            &works_by_id,
            &bookmarked_ids,
            profile.as_ref(),
            1,
            self.max_candidates as u32,
        );

        let start = ((page.saturating_sub(1)) as usize) * (page_size as usize);
        let page_results: Vec<MonologueResult> =
            all_results.iter().skip(start).take(page_size as usize).cloned().collect();

        Ok((page_results, total, best_match_id, all_results))
    }

    /// Rehydrates a page of [`MonologueResult`] from a cached, already-ranked
    /// result set. Score, `match_type` and `best_match_id` are replayed
    /// exactly as the original search produced them; only the per-row
    /// display fields (title, author, redaction) are re-read from the
    /// repositories so a since-updated work or monologue still renders
    /// correctly. Result order is preserved exactly.
    async fn hydrate_cached_page(&self, cached: &CachedResults, page: u32, page_size: u32) -> Result<SearchResponse> {
        let start = ((page.saturating_sub(1)) as usize) * (page_size as usize);
        let page_entries: Vec<&CachedResult> = cached.results.iter().skip(start).take(page_size as usize).collect();

        let monologues_by_id: HashMap<Uuid, acting_search_core::types::Monologue> =
            futures::future::join_all(page_entries.iter().map(|entry| self.monologues.get_by_id(entry.id)))
                .await
                .into_iter()
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .map(|m| (m.id, m))
                .collect();

        let work_ids: Vec<Uuid> = monologues_by_id.values().map(|m| m.work_id).collect();
        let works_by_id = self.works.get_by_ids(&work_ids).await?;

        let results = page_entries
            .into_iter()
            .filter_map(|entry| {
                let monologue = monologues_by_id.get(&entry.id)?;
                let work = works_by_id.get(&monologue.work_id);
                let is_public_domain = work
                    .map(|w| w.copyright_status == acting_search_core::types::CopyrightStatus::PublicDomain)
                    .unwrap_or(false);
                Some(MonologueResult {
                    id: monologue.id,
                    play_title: work.map(|w| w.title.clone()).unwrap_or_default(),
                    author: work.map(|w| w.author.clone()).unwrap_or_default(),
                    source_url: work.and_then(|w| w.source_url.clone()),
                    character_name: monologue.character_name.clone(),
                    text: is_public_domain.then(|| monologue.text.clone()),
                    relevance_score: entry.score,
                    match_type: entry.match_type,
                })
            })
            .collect();

        Ok(SearchResponse {
            results,
            total: cached.results.len() as i64,
            page,
            page_size,
            corrected_query: None,
            best_match_id: cached.best_match_id,
        })
    }

    /// `q=""` discover mode: bypasses the gate and both
    /// retrievers entirely, honoring only the scalar filters.
    pub async fn discover(
        &self,
        _user: &AuthenticatedUser,
        filters: &Filters,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse> {
        let rows = self.monologues.discover_random(filters, page_size as i64).await?;
        let results = self.attribute_unranked(rows).await?;
        Ok(SearchResponse {
            results,
            total: 0,
            page,
            page_size,
            corrected_query: None,
            best_match_id: None,
        })
    }

    /// Fast SQL-only path, with the slow semantic path falling back to it on
    /// failure.
    pub async fn recommend_for_actor(&self, user_id: Uuid, fast: bool, limit: i64) -> Result<Vec<MonologueResult>> {
        let profile = self.actor_profiles.get(user_id).await.unwrap_or(None);
        let gender = profile.as_ref().and_then(|p| p.gender.as_deref());
        let difficulty = profile
            .as_ref()
            .and_then(|p| p.experience_level)
            .map(|e| e.to_difficulty());

        if fast {
            let rows = self.monologues.recommend_fast(gender, difficulty, limit).await?;
            return self.attribute_unranked(rows).await;
        }

        let pseudo_query = profile
            .as_ref()
            .map(|p| p.preferred_genres.join(" "))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "monologue".to_string());

        match self.embedder.embed_query(&pseudo_query, &Filters::default()).await {
            Ok(embedding) => match self.monologues.dense_search(&embedding, &Filters::default(), limit).await {
                Ok(scored) => {
                    let monologues = scored.into_iter().map(|s| s.monologue).collect();
                    self.attribute_unranked(monologues).await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "semantic recommend failed, falling back to fast path");
                    let rows = self.monologues.recommend_fast(gender, difficulty, limit).await?;
                    self.attribute_unranked(rows).await
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "embedding failed for recommend, falling back to fast path");
                let rows = self.monologues.recommend_fast(gender, difficulty, limit).await?;
                self.attribute_unranked(rows).await
            }
        }
    }

    /// "Similar-to-this-monologue", with the
    /// non-embedding fallback (same author, else same primary emotion) when
    /// the seed row has no embedding.
    pub async fn similar_to(&self, monologue_id: Uuid, limit: i64) -> Result<Vec<MonologueResult>> {
        let scored = self.monologues.similar_to(monologue_id, limit).await?;
        if !scored.is_empty() {
            let monologues = scored.into_iter().map(|s| s.monologue).collect();
            return self.attribute_unranked(monologues).await;
        }

        let Some(seed) = self.monologues.get_by_id(monologue_id).await? else {
            return Err(Error::InvalidInput("monologue not found".to_string()));
        };
        let author = self.works.get_by_id(seed.work_id).await?.map(|w| w.author);
        let rows = self
            .monologues
            .similar_by_metadata(monologue_id, author.as_deref(), seed.primary_emotion.as_deref(), limit)
            .await?;
        self.attribute_unranked(rows).await
    }

    pub async fn trending(&self, filters: &Filters, limit: i64) -> Result<Vec<MonologueResult>> {
        let rows = self.monologues.trending(filters, limit).await?;
        self.attribute_unranked(rows).await
    }

    pub async fn fresh_picks(&self, filters: &Filters, limit: i64) -> Result<Vec<MonologueResult>> {
        let rows = self.monologues.fresh_picks(filters, limit).await?;
        self.attribute_unranked(rows).await
    }

    pub async fn favorite(&self, user_id: Uuid, monologue_id: Uuid) -> Result<()> {
        self.favorites.favorite(user_id, FavoriteTarget::Monologue, monologue_id).await?;
        Ok(())
    }

    pub async fn unfavorite(&self, user_id: Uuid, monologue_id: Uuid) -> Result<()> {
        self.favorites.unfavorite(user_id, FavoriteTarget::Monologue, monologue_id).await?;
        Ok(())
    }

    async fn gate_allow(&self, user: &AuthenticatedUser, feature: Feature) -> Result<()> {
        let decision = self
            .gate
            .allow(user.user_id, feature, user.is_superuser, user.environment, true)
            .await?;
        match decision {
            GateDecision::Allow => Ok(()),
            GateDecision::Denied(GateDenialReason::FeatureNotAvailable { feature }) => {
                Err(Error::FeatureNotAvailable { feature })
            }
            GateDecision::Denied(GateDenialReason::QuotaExceeded { feature, limit, used }) => {
                Err(Error::QuotaExceeded { feature, limit, used })
            }
        }
    }

    /// Browse-style endpoints (discover/trending/fresh/recommend) have no
    /// query to score against; rows keep arrival order and are annotated
    /// `Lexical` as a neutral placeholder since `MonologueResult` always
    /// carries a `match_type`.
    async fn attribute_unranked(&self, rows: Vec<acting_search_core::types::Monologue>) -> Result<Vec<MonologueResult>> {
        let work_ids: Vec<Uuid> = rows.iter().map(|m| m.work_id).collect();
        let works_by_id = self.works.get_by_ids(&work_ids).await?;

        Ok(rows
            .into_iter()
            .map(|monologue| {
                let work = works_by_id.get(&monologue.work_id);
                let is_public_domain = work
                    .map(|w| w.copyright_status == acting_search_core::types::CopyrightStatus::PublicDomain)
                    .unwrap_or(false);
                MonologueResult {
                    id: monologue.id,
                    play_title: work.map(|w| w.title.clone()).unwrap_or_default(),
                    author: work.map(|w| w.author.clone()).unwrap_or_default(),
                    source_url: work.and_then(|w| w.source_url.clone()),
                    character_name: monologue.character_name,
                    text: is_public_domain.then_some(monologue.text),
                    relevance_score: 0.0,
                    match_type: MatchType::Lexical,
                }
            })
            .collect())
    }
}
