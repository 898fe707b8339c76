//! Query understanding, caching and ranking for the acting-material search
//! engine: everything between "normalized query" and "ranked page", plus
//! the orchestrator's non-HTTP supplement operations that reuse the same
//! building blocks.
//!
//! This crate depends on `acting-search-persistence` for raw reads/writes
//! and does all ranking and filter-merging itself; it never issues SQL of
//! its own.

pub mod cache;
pub mod classifier;
pub mod dictionary;
pub mod embeddings;
pub mod error;
pub mod gate;
pub mod keyword_extractor;
pub mod merger;
pub mod typo_corrector;

pub use cache::{CacheHierarchy, CachedResult, CachedResults, L0Cache, RedisCache};
pub use classifier::classify;
pub use embeddings::{
    film_tv_enriched_text, monologue_enriched_text, query_enriched_text, CachedEmbedder,
};
pub use error::CacheError;
pub use gate::{Gate, PersistenceTierResolver};
pub use keyword_extractor::{extract, ExtractionResult};
pub use merger::merge;
pub use typo_corrector::{correct, TypoCorrection};
