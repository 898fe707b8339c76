//! Typed application settings, layered `File(TOML) -> Environment`.
//! Loading order mirrors the workspace convention:
//! defaults baked into `Default` impls, overridden by `config/*.toml`,
//! overridden again by `ACTING_SEARCH_`-prefixed environment variables.

use std::collections::HashSet;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment `ENV: enum{prod,dev,local}`.
/// Dev/local bypass the rate-limit gate (but still increment counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Prod,
    #[default]
    Dev,
    Local,
}

impl RuntimeEnvironment {
    pub fn bypasses_gate(self) -> bool {
        matches!(self, RuntimeEnvironment::Dev | RuntimeEnvironment::Local)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Total request budget before the orchestrator must respond,
    /// regardless of how much upstream work remains.
    pub request_deadline_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            cors_origins: vec!["*".to_string()],
            request_deadline_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/acting_search".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub redis_enabled: bool,
    pub redis_url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            redis_enabled: true,
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub embedding_api_base: String,
    pub embedding_api_key: Option<String>,
    pub embedding_dims: usize,
    pub llm_api_base: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            embedding_api_base: "https://api.openai.com/v1".to_string(),
            embedding_api_key: None,
            embedding_dims: 3072,
            llm_api_base: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// The out-of-scope authentication collaborator: given a bearer token it returns the user
/// id, superuser flag and environment. The core never stores passwords, so
/// this is only an HTTP address plus a service credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub auth_api_base: String,
    pub auth_api_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_api_base: "http://localhost:8081".to_string(),
            auth_api_key: None,
        }
    }
}

/// Search/ranking tunables: page size bounds, candidate cap, best-match
/// threshold, and embedding dimensionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_candidates: usize,
    pub best_match_threshold: f32,
    pub demo_rate_limit_window_sec: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_candidates: 500,
            best_match_threshold: 0.90,
            demo_rate_limit_window_sec: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: SearchLimits,
    /// Emails bypassing the gate outright (still increment counters).
    #[serde(default)]
    pub superuser_emails: HashSet<String>,
}

/// Load settings from `config/{base,<env>}.toml` plus `ACTING_SEARCH_*`
/// environment variable overrides (e.g. `ACTING_SEARCH_DATABASE__DATABASE_URL`).
pub fn load_settings(config_dir: &str) -> Result<Settings, ConfigError> {
    let run_env = std::env::var("ACTING_SEARCH_ENV").unwrap_or_else(|_| "dev".to_string());

    let builder = Config::builder()
        .add_source(File::with_name(&format!("{config_dir}/base")).required(false))
        .add_source(File::with_name(&format!("{config_dir}/{run_env}")).required(false))
        .add_source(
            Environment::with_prefix("ACTING_SEARCH")
                .separator("__")
                .try_parsing(true),
        );

    let settings: Settings = builder.build()?.try_deserialize()?;

    tracing::debug!(
        environment = ?settings.environment,
        redis_enabled = settings.redis.redis_enabled,
        "settings loaded"
    );

    Ok(settings)
}
