//! Crate-local error type for the cache hierarchy. Cache failures are
//! deliberately never propagated past the layer that detects them — every
//! caller in this crate treats an `Err` here as "fall through to the next
//! layer" rather than failing the request.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cache disabled")]
    Disabled,
}

pub type Result<T> = std::result::Result<T, CacheError>;
