//! Base tier + per-user override lookups backing
//! `acting_search_core::TierResolver`.

use std::collections::BTreeMap;

use acting_search_core::types::{Feature, FeatureLimit, Tier, TierOverride};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

#[derive(Clone)]
pub struct TierRepository {
    pool: PgPool,
}

impl TierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's base tier, joined through `user_tiers`. Falls back to a
    /// tier named `"free"` if the user has no row yet (new signups land here
    /// before billing provisions a paid tier).
    pub async fn base_tier(&self, user_id: Uuid) -> Result<Tier> {
        let row: Option<(String, Value)> = sqlx::query_as(
            "select t.name, t.limits from tiers t \
             join user_tiers ut on ut.tier_name = t.name where ut.user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let (name, limits_json) = match row {
            Some(found) => found,
            None => {
                let fallback: Option<(String, Value)> =
                    sqlx::query_as("select name, limits from tiers where name = 'free'")
                        .fetch_optional(&self.pool)
                        .await?;
                fallback.ok_or(PersistenceError::NotFound)?
            }
        };

        parse_tier(name, limits_json)
    }

    /// Active, non-expired overrides for the user.
    pub async fn overrides(&self, user_id: Uuid) -> Result<Vec<TierOverride>> {
        let rows: Vec<(String, bool, Option<i32>, Option<DateTime<Utc>>)> = sqlx::query_as(
            "select feature, revoke, replacement_limit, expires_at \
             from tier_overrides where user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(feature, revoke, replacement_limit, expires_at)| {
                Ok(TierOverride {
                    user_id,
                    feature: parse_feature(&feature)?,
                    revoke,
                    replacement_limit: replacement_limit.map(FeatureLimit),
                    expires_at,
                })
            })
            .collect()
    }
}

fn parse_feature(s: &str) -> Result<Feature> {
    match s {
        "ai_search" => Ok(Feature::AiSearch),
        "total_search" => Ok(Feature::TotalSearch),
        "scene_partner" => Ok(Feature::ScenePartner),
        "craft_coach" => Ok(Feature::CraftCoach),
        other => Err(PersistenceError::InvalidRow(format!("unknown feature {other:?}"))),
    }
}

fn parse_tier(name: String, limits_json: Value) -> Result<Tier> {
    let raw: BTreeMap<String, i32> = serde_json::from_value(limits_json)
        .map_err(|e| PersistenceError::InvalidRow(format!("bad tier limits json: {e}")))?;

    let mut limits = BTreeMap::new();
    for (feature, limit) in raw {
        limits.insert(parse_feature(&feature)?, FeatureLimit(limit));
    }

    Ok(Tier { name, limits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_tier_maps_known_features() {
        let tier = parse_tier(
            "pro".to_string(),
            json!({"ai_search": -1, "total_search": 100, "scene_partner": 0}),
        )
        .unwrap();

        assert_eq!(tier.name, "pro");
        assert_eq!(tier.limits[&Feature::AiSearch], FeatureLimit::UNLIMITED);
        assert_eq!(tier.limits[&Feature::TotalSearch], FeatureLimit(100));
        assert_eq!(tier.limits[&Feature::ScenePartner], FeatureLimit::FORBIDDEN);
    }

    #[test]
    fn parse_tier_rejects_unknown_feature() {
        let result = parse_tier("pro".to_string(), json!({"telepathy": 5}));
        assert!(result.is_err());
    }
}
