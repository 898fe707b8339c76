//! Idempotent favorite/unfavorite toggling, consumed by the Rank Merger's
//! bookmark boost.

use acting_search_core::types::FavoriteTarget;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

fn target_str(target: FavoriteTarget) -> &'static str {
    match target {
        FavoriteTarget::Monologue => "monologue",
        FavoriteTarget::FilmTvReference => "film_tv_reference",
    }
}

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `favorite(user_id, target_id)` twice is a no-op: `ON CONFLICT DO
    /// NOTHING` rather than an error.
    pub async fn favorite(&self, user_id: Uuid, target: FavoriteTarget, target_id: Uuid) -> Result<()> {
        sqlx::query(
            "insert into favorites (user_id, target, target_id) values ($1, $2, $3) \
             on conflict (user_id, target, target_id) do nothing",
        )
        .bind(user_id)
        .bind(target_str(target))
        .bind(target_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `unfavorite` on a row that was never favorited is likewise a no-op.
    pub async fn unfavorite(&self, user_id: Uuid, target: FavoriteTarget, target_id: Uuid) -> Result<()> {
        sqlx::query("delete from favorites where user_id = $1 and target = $2 and target_id = $3")
            .bind(user_id)
            .bind(target_str(target))
            .bind(target_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_favorited(&self, user_id: Uuid, target: FavoriteTarget, target_id: Uuid) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "select 1 from favorites where user_id = $1 and target = $2 and target_id = $3",
        )
        .bind(user_id)
        .bind(target_str(target))
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// All monologue ids the user has bookmarked, used by the Rank Merger to
    /// apply the bookmark boost across a whole result page in one query
    /// rather than one `is_favorited` call per row.
    pub async fn bookmarked_monologue_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "select target_id from favorites where user_id = $1 and target = 'monologue'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
