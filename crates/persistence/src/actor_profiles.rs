//! Reads the searching user's `ActorProfile`, which drives the Rank
//! Merger's profile-bias boost. Owned by an out-of-scope onboarding flow; this crate only reads it.

use acting_search_core::types::{ActorProfile, ExperienceLevel};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

#[derive(sqlx::FromRow)]
struct ActorProfileRow {
    user_id: Uuid,
    gender: Option<String>,
    age_range: Option<String>,
    preferred_genres: Vec<String>,
    experience_level: Option<String>,
    overdone_alert_sensitivity: f32,
    profile_bias_enabled: bool,
}

impl TryFrom<ActorProfileRow> for ActorProfile {
    type Error = PersistenceError;

    fn try_from(row: ActorProfileRow) -> std::result::Result<Self, Self::Error> {
        let experience_level = row
            .experience_level
            .map(|s| match s.as_str() {
                "beginner" => Ok(ExperienceLevel::Beginner),
                "intermediate" => Ok(ExperienceLevel::Intermediate),
                "advanced" => Ok(ExperienceLevel::Advanced),
                "professional" => Ok(ExperienceLevel::Professional),
                other => Err(PersistenceError::InvalidRow(format!("bad experience_level {other:?}"))),
            })
            .transpose()?;

        Ok(ActorProfile {
            user_id: row.user_id,
            gender: row.gender,
            age_range: row.age_range,
            preferred_genres: row.preferred_genres,
            experience_level,
            overdone_alert_sensitivity: row.overdone_alert_sensitivity,
            profile_bias_enabled: row.profile_bias_enabled,
        })
    }
}

#[derive(Clone)]
pub struct ActorProfileRepository {
    pool: PgPool,
}

impl ActorProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `None` when the user has not completed onboarding yet; callers treat
    /// that as profile-bias disabled rather than an error.
    pub async fn get(&self, user_id: Uuid) -> Result<Option<ActorProfile>> {
        let row = sqlx::query_as::<_, ActorProfileRow>("select * from actor_profiles where user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ActorProfile::try_from).transpose()
    }
}
