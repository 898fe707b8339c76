//! Chat-completion-backed structured filter extraction, Tier 3 only.

use std::time::Duration;

use acting_search_core::traits::LlmQueryParser;
use acting_search_core::types::{CategoryFilter, Filters};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

const SYSTEM_PROMPT: &str = "Extract search filters from the user's query about theatrical monologues. \
Respond with a JSON object whose keys are a strict subset of \
{gender, age_range, emotion, themes, category, tone}. Omit keys you cannot infer with confidence. \
Never include null values. Respond with JSON only, no prose.";

/// Enforces the system prompt's "strict subset of keys" contract at the
/// wire boundary: `additionalProperties: false` rejects any key the model
/// hallucinates outside the six it was told about, before `RawFilters`
/// deserialization ever runs.
static RESPONSE_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "gender": {"type": "string"},
            "age_range": {"type": "string"},
            "emotion": {"type": "string"},
            "themes": {"type": "array", "items": {"type": "string"}},
            "category": {},
            "tone": {"type": "string"},
        },
    });
    JSONSchema::compile(&schema).expect("static query-parser response schema is valid")
});

#[derive(Debug, Clone)]
pub struct QueryParserConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for QueryParserConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpQueryParser {
    client: Client,
    config: QueryParserConfig,
}

impl HttpQueryParser {
    pub fn new(config: QueryParserConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("query parser http client");
        Self { client, config }
    }
}

#[async_trait]
impl LlmQueryParser for HttpQueryParser {
    /// On any parse error or upstream error, return empty filters rather
    /// than fail the request — callers never see this
    /// collaborator's errors.
    async fn parse(&self, query: &str) -> acting_search_core::Result<Filters> {
        match self.try_parse(query).await {
            Ok(filters) => Ok(filters),
            Err(err) => {
                tracing::warn!(error = %err, "llm query parse failed, falling back to empty filters");
                Ok(Filters::default())
            }
        }
    }
}

impl HttpQueryParser {
    async fn try_parse(&self, query: &str) -> Result<Filters, crate::error::LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: 0.1,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .json(&request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(crate::error::LlmError::Api(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| crate::error::LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| crate::error::LlmError::InvalidResponse("no choices returned".to_string()))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| crate::error::LlmError::InvalidResponse(e.to_string()))?;

        if let Err(errors) = RESPONSE_SCHEMA.validate(&value) {
            let detail = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(crate::error::LlmError::SchemaViolation(detail));
        }

        let raw: RawFilters = serde_json::from_value(value)
            .map_err(|e| crate::error::LlmError::InvalidResponse(e.to_string()))?;

        Ok(raw.into())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage2,
}

#[derive(Debug, Deserialize)]
struct ChatMessage2 {
    content: String,
}

/// Mirrors the system prompt's JSON contract exactly; deliberately
/// permissive (`#[serde(default)]` everywhere) since the model is
/// instructed to omit keys, not emit nulls, but upstream behavior is never
/// fully trusted.
#[derive(Debug, Default, Deserialize)]
struct RawFilters {
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    age_range: Option<String>,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    category: Option<CategoryFilter>,
    #[serde(default)]
    tone: Option<String>,
}

impl From<RawFilters> for Filters {
    fn from(raw: RawFilters) -> Self {
        Filters {
            gender: raw.gender,
            age_range: raw.age_range,
            emotion: raw.emotion,
            themes: raw.themes,
            character_name: None,
            category: raw.category,
            tone: raw.tone,
            difficulty: None,
            author: None,
            act: None,
            scene: None,
            max_duration: None,
            exclude_overdone: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_filters_with_missing_keys_parse() {
        let raw: RawFilters = serde_json::from_str(r#"{"gender": "female", "themes": ["betrayal"]}"#).unwrap();
        let filters: Filters = raw.into();
        assert_eq!(filters.gender.as_deref(), Some("female"));
        assert_eq!(filters.themes, vec!["betrayal".to_string()]);
        assert!(filters.emotion.is_none());
    }

    #[test]
    fn empty_object_parses_to_default_filters() {
        let raw: RawFilters = serde_json::from_str("{}").unwrap();
        let filters: Filters = raw.into();
        assert_eq!(filters, Filters::default());
    }

    #[test]
    fn schema_accepts_known_keys_only() {
        let value = json!({"gender": "female", "themes": ["betrayal"]});
        assert!(RESPONSE_SCHEMA.validate(&value).is_ok());
    }

    #[test]
    fn schema_rejects_hallucinated_keys() {
        let value = json!({"gender": "female", "mood_board": "dark"});
        assert!(RESPONSE_SCHEMA.validate(&value).is_err());
    }
}
