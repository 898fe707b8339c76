//! Postgres connection pool construction.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::Result;

/// Builds a bounded connection pool. `max_connections` comes from
/// `acting_search_config::DatabaseConfig`; the caller passes it explicitly so
/// this crate stays free of a dependency on `acting-search-config`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "connected to postgres");
    Ok(pool)
}
