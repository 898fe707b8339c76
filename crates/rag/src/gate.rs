//! Rate-limit & quota gate: `Check`/`Record` split so a request that fails
//! downstream never consumes quota for work it never completed.

use std::sync::Arc;

use acting_search_core::traits::TierResolver;
use acting_search_core::types::{Feature, FeatureLimit, GateDecision, GateDenialReason, RuntimeEnvironment};
use acting_search_core::Result;
use chrono::Utc;
use uuid::Uuid;

use acting_search_persistence::{TierRepository, UsageRepository};

/// Resolves a user's effective `feature -> limit`, applying per-user
/// overrides on top of the base tier: revoke sets `forbidden`, a
/// replacement limit substitutes the value, and any override whose
/// `expires_at` is past is ignored.
pub struct PersistenceTierResolver {
    tiers: TierRepository,
}

impl PersistenceTierResolver {
    pub fn new(tiers: TierRepository) -> Self {
        Self { tiers }
    }
}

#[async_trait::async_trait]
impl TierResolver for PersistenceTierResolver {
    async fn effective_limit(&self, user_id: Uuid, feature: Feature) -> Result<FeatureLimit> {
        let tier = self.tiers.base_tier(user_id).await?;
        let mut limit = tier.limits.get(&feature).copied().unwrap_or(FeatureLimit::FORBIDDEN);

        let overrides = self.tiers.overrides(user_id).await?;
        let now = Utc::now();
        for ovr in overrides {
            if ovr.feature != feature {
                continue;
            }
            if let Some(expires_at) = ovr.expires_at {
                if expires_at <= now {
                    continue;
                }
            }
            if ovr.revoke {
                limit = FeatureLimit::FORBIDDEN;
            } else if let Some(replacement) = ovr.replacement_limit {
                limit = replacement;
            }
        }

        Ok(limit)
    }
}

/// The superuser allowlist is resolved upstream, into
/// `AuthenticatedUser::is_superuser`, by the auth collaborator; the gate
/// itself only needs the boolean flag plus the environment. Superuser and
/// local/development environments bypass the gate but still increment
/// counters when asked.
pub struct Gate {
    resolver: Arc<dyn TierResolver>,
    usage: UsageRepository,
}

impl Gate {
    pub fn new(resolver: Arc<dyn TierResolver>, usage: UsageRepository) -> Self {
        Self { resolver, usage }
    }

    fn bypasses(&self, is_superuser: bool, environment: RuntimeEnvironment) -> bool {
        is_superuser || environment.bypasses_gate()
    }

    /// No side effect; used standalone by callers that only need to know
    /// whether a request would be allowed.
    pub async fn check(
        &self,
        user_id: Uuid,
        feature: Feature,
        is_superuser: bool,
        environment: RuntimeEnvironment,
    ) -> Result<GateDecision> {
        if self.bypasses(is_superuser, environment) {
            return Ok(GateDecision::Allow);
        }

        let limit = self.resolver.effective_limit(user_id, feature).await?;
        if limit.is_forbidden() {
            return Ok(GateDecision::Denied(GateDenialReason::FeatureNotAvailable { feature }));
        }
        if limit.is_unlimited() {
            return Ok(GateDecision::Allow);
        }

        let today = Utc::now().date_naive();
        let used = self.usage.month_to_date(user_id, feature, today).await?;
        if used >= limit.0 {
            return Ok(GateDecision::Denied(GateDenialReason::QuotaExceeded { feature, limit: limit.0, used }));
        }
        Ok(GateDecision::Allow)
    }

    /// The increment half. Superuser/dev/local bypass still records usage
    /// when explicitly asked, matching the "but still increment counters
    /// when asked" clause.
    pub async fn record(&self, user_id: Uuid, feature: Feature) -> Result<()> {
        let today = Utc::now().date_naive();
        self.usage.increment(user_id, feature, today).await?;
        Ok(())
    }

    /// `Allow(user, feature, increment)` combined convenience used by the
    /// orchestrator's step 1: `Check` then, iff allowed and asked,
    /// `Record`.
    pub async fn allow(
        &self,
        user_id: Uuid,
        feature: Feature,
        is_superuser: bool,
        environment: RuntimeEnvironment,
        increment: bool,
    ) -> Result<GateDecision> {
        let decision = self.check(user_id, feature, is_superuser, environment).await?;
        if decision == GateDecision::Allow && increment {
            self.record(user_id, feature).await?;
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_and_forbidden_are_distinguishable() {
        assert!(FeatureLimit::UNLIMITED.is_unlimited());
        assert!(FeatureLimit::FORBIDDEN.is_forbidden());
        assert!(!FeatureLimit(50).is_unlimited());
    }

    #[test]
    fn dev_and_local_bypass_but_prod_does_not() {
        assert!(RuntimeEnvironment::Dev.bypasses_gate());
        assert!(RuntimeEnvironment::Local.bypasses_gate());
        assert!(!RuntimeEnvironment::Prod.bypasses_gate());
    }
}
