//! Domain types, error taxonomy and retrieval traits for the acting-material
//! search engine.
//!
//! This crate has no knowledge of HTTP, Postgres or any specific upstream
//! API — it defines the vocabulary (`types`) and the seams (`traits`) that
//! `persistence`, `llm`, `rag` and `server` build on.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{AuthClient, EmbeddingProvider, KeyValueCache, LlmQueryParser, TierResolver};
pub use types::{
    ActorProfile, AgeRange, AuthenticatedUser, Category, CategoryFilter, CopyrightStatus,
    ExperienceLevel, Favorite, FavoriteTarget, Feature, FeatureLimit, Filters, FilmTvKind,
    FilmTvReference, GateDecision, GateDenialReason, Gender, Monologue, MonologueResult,
    MatchType, QueryTier, RuntimeEnvironment, SearchRequest, SearchResponse, Tier, TierOverride,
    UsageCounter, Work,
};
