//! Domain types shared by every crate in the workspace.
//!
//! The core crate owns these definitions so that `persistence`, `rag`,
//! `llm` and `server` all speak the same vocabulary instead of passing
//! around untyped maps.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed vocabulary for `character_gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Any,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Any => write!(f, "any"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "man" => Ok(Gender::Male),
            "female" | "woman" => Ok(Gender::Female),
            "any" => Ok(Gender::Any),
            _ => Err(()),
        }
    }
}

/// Closed vocabulary for `character_age_range`. Stored as a string column in
/// Postgres (it also carries legacy values such as `"20-30"`), so this type
/// is deliberately a thin string wrapper rather than a fixed enum.
pub type AgeRange = String;

/// Work category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Classical,
    Contemporary,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Classical => write!(f, "classical"),
            Category::Contemporary => write!(f, "contemporary"),
        }
    }
}

/// A play or film/TV title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub category: Category,
    pub copyright_status: CopyrightStatus,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyrightStatus {
    PublicDomain,
    Licensed,
    Unknown,
}

/// A single character speech extracted from a `Work`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monologue {
    pub id: Uuid,
    pub work_id: Uuid,
    pub character_name: String,
    pub text: String,
    pub word_count: i32,
    pub estimated_duration_seconds: i32,
    pub primary_emotion: Option<String>,
    pub themes: Vec<String>,
    pub tone: Option<String>,
    pub difficulty_level: Option<String>,
    pub character_gender: Gender,
    pub character_age_range: AgeRange,
    pub act: Option<i32>,
    pub scene: Option<i32>,
    pub overdone_score: f32,
    pub favorite_count: i64,
    pub view_count: i64,
    pub search_tags: Vec<String>,
    /// Non-null only once the ingestion/backfill pipeline has written a
    /// 3072-dim embedding derived from `embedding_text(self)`.
    pub embedding_vector: Option<Vec<f32>>,
}

impl Monologue {
    /// `estimated_duration_seconds = floor(word_count / 150 * 60)`.
    /// Recomputed whenever `text` changes.
    pub fn recompute_duration(word_count: i32) -> i32 {
        ((word_count as f64 / 150.0) * 60.0).floor() as i32
    }
}

/// A film or TV title used for search parity with monologues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmTvReference {
    pub id: Uuid,
    pub title: String,
    pub year: Option<i32>,
    pub kind: FilmTvKind,
    pub genre: Vec<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub actors: Vec<String>,
    pub imdb_rating: Option<f32>,
    pub poster_url: Option<String>,
    pub imdb_id: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilmTvKind {
    Movie,
    TvSeries,
}

/// The searching user's structured self-description; drives profile-bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorProfile {
    pub user_id: Uuid,
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub preferred_genres: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub overdone_alert_sensitivity: f32,
    pub profile_bias_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Professional,
}

impl ExperienceLevel {
    /// Maps `experience_level -> difficulty` (beginner/intermediate pass
    /// through, advanced and professional both collapse to "advanced").
    pub fn to_difficulty(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced | ExperienceLevel::Professional => "advanced",
        }
    }
}

/// Which table a `Favorite` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteTarget {
    Monologue,
    FilmTvReference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub target: FavoriteTarget,
    pub target_id: Uuid,
}

/// A feature gated by `Tier` / metered by `UsageCounter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AiSearch,
    TotalSearch,
    ScenePartner,
    CraftCoach,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feature::AiSearch => "ai_search",
            Feature::TotalSearch => "total_search",
            Feature::ScenePartner => "scene_partner",
            Feature::CraftCoach => "craft_coach",
        };
        write!(f, "{s}")
    }
}

impl Feature {
    /// The usage-field name the quota-exceeded error slug is built from
    /// (e.g. `ai_searches_count` -> `ai_searches_count_limit_exceeded`),
    /// matching the original `UsageMetrics` column names rather than the
    /// `Feature` variant's own snake-case name.
    pub fn usage_field(self) -> &'static str {
        match self {
            Feature::AiSearch => "ai_searches_count",
            Feature::TotalSearch => "total_searches_count",
            Feature::ScenePartner => "scene_partner_count",
            Feature::CraftCoach => "craft_coach_count",
        }
    }
}

/// `(user_id, date, feature) -> integer`, one durable row per (user, day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageCounter {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub feature: Feature,
    pub count: i32,
}

/// `feature -> limit`, `-1` = unlimited, `0` = forbidden, `>0` = monthly quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLimit(pub i32);

impl FeatureLimit {
    pub const FORBIDDEN: FeatureLimit = FeatureLimit(0);
    pub const UNLIMITED: FeatureLimit = FeatureLimit(-1);

    pub fn is_unlimited(self) -> bool {
        self.0 == -1
    }

    pub fn is_forbidden(self) -> bool {
        self.0 == 0
    }
}

/// The subscription plan governing a user's feature limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub limits: std::collections::BTreeMap<Feature, FeatureLimit>,
}

/// A per-user override on top of a `Tier`: either revokes a feature or
/// replaces its limit. Overrides whose `expires_at` is past are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierOverride {
    pub user_id: Uuid,
    pub feature: Feature,
    pub revoke: bool,
    pub replacement_limit: Option<FeatureLimit>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The authenticated caller, as returned by the external auth collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub is_superuser: bool,
    pub environment: RuntimeEnvironment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Prod,
    Dev,
    Local,
}

impl RuntimeEnvironment {
    pub fn bypasses_gate(self) -> bool {
        matches!(self, RuntimeEnvironment::Dev | RuntimeEnvironment::Local)
    }
}

/// Structured search filters as an explicit, tagged record rather than an
/// untyped map.
///
/// Every field is optional because a filter set may be partially populated by
/// keyword extraction, partially by the LLM parser, and partially by
/// explicit query parameters; callers merge with [`Filters::merge_onto`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub emotion: Option<String>,
    pub themes: Vec<String>,
    pub character_name: Option<String>,
    pub category: Option<CategoryFilter>,
    pub tone: Option<String>,
    pub difficulty: Option<String>,
    pub author: Option<String>,
    pub act: Option<i32>,
    pub scene: Option<i32>,
    pub max_duration: Option<i32>,
    pub exclude_overdone: bool,
}

/// `category` may be a single value or an OR'd list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryFilter {
    Single(String),
    Any(Vec<String>),
}

impl CategoryFilter {
    pub fn values(&self) -> Vec<&str> {
        match self {
            CategoryFilter::Single(s) => vec![s.as_str()],
            CategoryFilter::Any(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl Filters {
    /// Merge `self` (lower precedence) with `other` (higher precedence),
    /// field by field. Used twice in the orchestrator: keyword wins over the
    /// LLM parse, and explicit request filters win over everything else.
    pub fn merge_onto(mut self, other: Filters) -> Filters {
        if other.gender.is_some() {
            self.gender = other.gender;
        }
        if other.age_range.is_some() {
            self.age_range = other.age_range;
        }
        if other.emotion.is_some() {
            self.emotion = other.emotion;
        }
        if !other.themes.is_empty() {
            let mut set: BTreeSet<String> = self.themes.into_iter().collect();
            set.extend(other.themes);
            self.themes = set.into_iter().collect();
        }
        if other.character_name.is_some() {
            self.character_name = other.character_name;
        }
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.tone.is_some() {
            self.tone = other.tone;
        }
        if other.difficulty.is_some() {
            self.difficulty = other.difficulty;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.act.is_some() {
            self.act = other.act;
        }
        if other.scene.is_some() {
            self.scene = other.scene;
        }
        if other.max_duration.is_some() {
            self.max_duration = other.max_duration;
        }
        self.exclude_overdone = self.exclude_overdone || other.exclude_overdone;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Filters::default()
    }

    /// Canonical `(key, value)` pairs, sorted, used for cache-key stability.
    pub fn sorted_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = &self.gender {
            pairs.push(("gender", v.clone()));
        }
        if let Some(v) = &self.age_range {
            pairs.push(("age_range", v.clone()));
        }
        if let Some(v) = &self.emotion {
            pairs.push(("emotion", v.clone()));
        }
        if !self.themes.is_empty() {
            let mut themes = self.themes.clone();
            themes.sort();
            pairs.push(("themes", themes.join(",")));
        }
        if let Some(v) = &self.character_name {
            pairs.push(("character_name", v.clone()));
        }
        if let Some(v) = &self.category {
            let mut values: Vec<&str> = v.values();
            values.sort();
            pairs.push(("category", values.join(",")));
        }
        if let Some(v) = &self.tone {
            pairs.push(("tone", v.clone()));
        }
        if let Some(v) = &self.difficulty {
            pairs.push(("difficulty", v.clone()));
        }
        if let Some(v) = &self.author {
            pairs.push(("author", v.clone()));
        }
        if let Some(v) = self.act {
            pairs.push(("act", v.to_string()));
        }
        if let Some(v) = self.scene {
            pairs.push(("scene", v.to_string()));
        }
        if let Some(v) = self.max_duration {
            pairs.push(("max_duration", v.to_string()));
        }
        if self.exclude_overdone {
            pairs.push(("exclude_overdone", "true".to_string()));
        }
        pairs.sort();
        pairs
    }
}

/// Query complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryTier {
    Tier1 = 1,
    Tier2 = 2,
    Tier3 = 3,
}

impl QueryTier {
    /// Estimated number of upstream API calls for metrics, assuming a cache miss.
    pub fn api_calls_estimate(self, cache_hit: bool) -> u8 {
        if cache_hit {
            return 0;
        }
        match self {
            QueryTier::Tier1 => 0,
            QueryTier::Tier2 => 1,
            QueryTier::Tier3 => 2,
        }
    }
}

/// Annotation surfaced by the lexical retriever only: set when the raw query string appears verbatim
/// (case-insensitive) in a row's `text`; otherwise `Lexical` or `Semantic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactQuote,
    FuzzyQuote,
    Semantic,
    Lexical,
}

/// A single ranked row returned to the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonologueResult {
    pub id: Uuid,
    pub play_title: String,
    pub author: String,
    pub source_url: Option<String>,
    pub character_name: String,
    /// Only populated for public-domain works
    pub text: Option<String>,
    pub relevance_score: f32,
    pub match_type: MatchType,
}

/// Paginated, attributed response for `/search/monologues` and its sibling
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<MonologueResult>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub corrected_query: Option<String>,
    pub best_match_id: Option<Uuid>,
}

/// Inbound search request, already validated against the HTTP layer's
/// bounds (`q` <= 500 chars, `limit` <= 100, `page` >= 1, ...).
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub explicit_filters: Filters,
    pub page: u32,
    pub page_size: u32,
}

/// The gate's decision for a single `Check` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Denied(GateDenialReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDenialReason {
    FeatureNotAvailable { feature: Feature },
    QuotaExceeded { feature: Feature, limit: i32, used: i32 },
}
