//! Crate-local error type. Every public function in this crate returns
//! [`PersistenceError`]; the `From` impl lets `?` convert straight into
//! `acting_search_core::Error` at the `rag`/`server` boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("invalid row data: {0}")]
    InvalidRow(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<PersistenceError> for acting_search_core::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Database(e) => e.into(),
            PersistenceError::NotFound => {
                acting_search_core::Error::InvalidInput("not found".to_string())
            }
            PersistenceError::InvalidRow(msg) => acting_search_core::Error::Internal(msg),
        }
    }
}
