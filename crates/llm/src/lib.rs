//! HTTP-backed upstream collaborators for the search engine: an embedding
//! provider and an LLM query parser.
//!
//! Both implement the trait seams from `acting_search_core::traits` so the
//! `rag` crate and the orchestrator never depend on a concrete vendor.

pub mod embeddings;
pub mod error;
pub mod query_parser;

pub use embeddings::{EmbeddingConfig, HttpEmbeddingProvider};
pub use error::LlmError;
pub use query_parser::{HttpQueryParser, QueryParserConfig};
