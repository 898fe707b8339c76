//! Trait seams between the orchestrator and its upstream collaborators:
//! vector store, cache, embedding/LLM APIs, auth. Keeping them as traits
//! in `core` lets `rag` depend only on the interfaces while
//! `persistence`/`llm`/`server` supply the concrete implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{AuthenticatedUser, Filters};

/// `embed(text) -> float[3072]` and `embed_batch`
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Preferred bulk path; default implementation just calls `embed` per
    /// item serially, which implementors with a real batch endpoint should
    /// override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize;
}

/// `parse(query) -> JSON filters` Implementations must follow the
/// failure policy of returning empty filters rather than propagating errors
/// up through the orchestrator.
#[async_trait]
pub trait LlmQueryParser: Send + Sync {
    async fn parse(&self, query: &str) -> Result<Filters>;
}

/// Given a bearer token, returns the user id, superuser flag and environment.
/// The core never stores passwords.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> Result<AuthenticatedUser>;
}

/// Minimal async key-value cache contract shared by the L0/L1 layers.
/// Values are opaque bytes; the caller is responsible for
/// (de)serialization. Failures are surfaced as
/// `Err` so callers can fall through to the next layer, but a failure must
/// never fail the overall request.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()>;
}

/// Resolves a user's effective tier (base tier + overrides) for the gate.
#[async_trait]
pub trait TierResolver: Send + Sync {
    async fn effective_limit(&self, user_id: Uuid, feature: crate::types::Feature) -> Result<crate::types::FeatureLimit>;
}
