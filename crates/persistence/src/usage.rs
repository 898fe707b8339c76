//! Per-user, per-feature daily usage counters backing the Gate's
//! month-to-date quota check.

use acting_search_core::types::Feature;
use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Clone)]
pub struct UsageRepository {
    pool: PgPool,
}

impl UsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sum of `UsageCounter` rows in `[first_of_month, today]`.
    pub async fn month_to_date(&self, user_id: Uuid, feature: Feature, today: NaiveDate) -> Result<i32> {
        let first_of_month = today.with_day(1).unwrap_or(today);

        let total: Option<i64> = sqlx::query_scalar(
            "select sum(count) from usage_counters \
             where user_id = $1 and feature = $2 and day >= $3 and day <= $4",
        )
        .bind(user_id)
        .bind(feature.to_string())
        .bind(first_of_month)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0) as i32)
    }

    /// Upserts today's counter, incrementing by one.
    pub async fn increment(&self, user_id: Uuid, feature: Feature, today: NaiveDate) -> Result<()> {
        sqlx::query(
            "insert into usage_counters (user_id, day, feature, count) values ($1, $2, $3, 1) \
             on conflict (user_id, day, feature) do update set count = usage_counters.count + 1",
        )
        .bind(user_id)
        .bind(today)
        .bind(feature.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
