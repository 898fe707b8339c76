//! Typed configuration for the acting-material search engine.
//!
//! Layers a TOML file over baked-in defaults over `ACTING_SEARCH_`-prefixed
//! environment variables, producing one [`Settings`] value consumed by
//! `server` at startup and threaded explicitly into `rag`/`llm`/`persistence`
//! rather than read from globals.

pub mod settings;

pub use settings::{
    load_settings, AuthConfig, DatabaseConfig, RedisConfig, RuntimeEnvironment, SearchLimits,
    ServerConfig, Settings, UpstreamConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
