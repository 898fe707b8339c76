//! Postgres + pgvector repositories for the acting-material search engine.
//!
//! One repository struct per table family, each a thin wrapper around a
//! shared [`sqlx::PgPool`]. This crate owns every SQL statement in the
//! workspace; `rag` depends on it for raw reads/writes and does all ranking
//! and filter-merging itself.

pub mod actor_profiles;
pub mod error;
pub mod favorites;
pub mod film_tv;
pub mod monologues;
pub mod pool;
pub mod tiers;
pub mod usage;
pub mod works;

pub use actor_profiles::ActorProfileRepository;
pub use error::{PersistenceError, Result};
pub use favorites::FavoriteRepository;
pub use film_tv::{FilmTvRepository, ScoredFilmTv};
pub use monologues::{MonologueRepository, ScoredMonologue};
pub use pool::connect;
pub use tiers::TierRepository;
pub use usage::UsageRepository;
pub use works::WorkRepository;
