//! Read access over `works`, the parent record a `Monologue` is excerpted
//! from. The merger and the HTTP layer join against it to fill in
//! `MonologueResult::play_title`/`author`/`source_url`.

use std::collections::HashMap;

use acting_search_core::types::{Category, CopyrightStatus, Work};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

#[derive(sqlx::FromRow)]
struct WorkRow {
    id: Uuid,
    title: String,
    author: String,
    year: Option<i32>,
    category: String,
    copyright_status: String,
    source_url: Option<String>,
}

impl TryFrom<WorkRow> for Work {
    type Error = PersistenceError;

    fn try_from(row: WorkRow) -> std::result::Result<Self, Self::Error> {
        let category = match row.category.as_str() {
            "classical" => Category::Classical,
            "contemporary" => Category::Contemporary,
            other => return Err(PersistenceError::InvalidRow(format!("bad category {other:?}"))),
        };
        let copyright_status = match row.copyright_status.as_str() {
            "public_domain" => CopyrightStatus::PublicDomain,
            "licensed" => CopyrightStatus::Licensed,
            "unknown" => CopyrightStatus::Unknown,
            other => return Err(PersistenceError::InvalidRow(format!("bad copyright_status {other:?}"))),
        };

        Ok(Work {
            id: row.id,
            title: row.title,
            author: row.author,
            year: row.year,
            category,
            copyright_status,
            source_url: row.source_url,
        })
    }
}

#[derive(Clone)]
pub struct WorkRepository {
    pool: PgPool,
}

impl WorkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Work>> {
        let row = sqlx::query_as::<_, WorkRow>("select * from works where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Work::try_from).transpose()
    }

    /// Batched lookup so the merger can attribute a whole result page with
    /// one round trip instead of one query per row.
    pub async fn get_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Work>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, WorkRow>("select * from works where id = any($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| Work::try_from(row).map(|w| (w.id, w)))
            .collect()
    }
}
