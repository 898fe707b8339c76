//! HTTP embedding client implementing `acting_search_core::EmbeddingProvider`.
//!
//! Single model, fixed 3072 dims, batches of 20, 3 retries with base-1s
//! exponential backoff; quota errors are never retried.

use std::time::Duration;

use acting_search_core::traits::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

const BATCH_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

pub struct HttpEmbeddingProvider {
    client: Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("embedding http client");
        Self { client, config }
    }

    async fn embed_one_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff;

        loop {
            match self.try_embed(inputs).await {
                Ok(vectors) => return Ok(vectors),
                Err(err @ LlmError::QuotaExceeded(_)) => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(err);
                    }
                    tracing::warn!(attempt, error = %err, "embedding request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn try_embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: inputs.to_vec(),
            dimensions: self.config.dimensions,
        };

        let mut req = self
            .client
            .post(format!("{}/embeddings", self.config.api_base))
            .json(&request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS || response.status() == StatusCode::PAYMENT_REQUIRED {
            return Err(LlmError::QuotaExceeded(format!(
                "embedding provider returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let mut by_index: Vec<Option<Vec<f32>>> = vec![None; inputs.len()];
        for item in parsed.data {
            if item.index < by_index.len() {
                by_index[item.index] = Some(item.embedding);
            }
        }
        by_index
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| LlmError::InvalidResponse(format!("missing embedding at index {i}"))))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> acting_search_core::Result<Vec<f32>> {
        let mut vectors = self.embed_one_batch(&[text.to_string()]).await?;
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> acting_search_core::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let vectors = self.embed_one_batch(chunk).await?;
            out.extend(vectors);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_split_at_twenty() {
        let texts: Vec<String> = (0..45).map(|i| i.to_string()).collect();
        let chunks: Vec<_> = texts.chunks(BATCH_SIZE).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 20);
        assert_eq!(chunks[2].len(), 5);
    }
}
