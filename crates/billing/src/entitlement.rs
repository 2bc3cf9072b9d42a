//! Plan entitlement checks
//!
//! Advisory predicates over a subscriber's reconciled state, mirroring what
//! the client application evaluates before offering a transformation.
//! Authoritative enforcement is [`SubscriptionRepository::increment_usage`]'s
//! quota check; these helpers alone are not a security boundary.
//!
//! [`SubscriptionRepository::increment_usage`]: crate::SubscriptionRepository::increment_usage

use serde::Serialize;

use crate::plans::PlanKey;
use crate::repository::SubscriptionRecord;

/// A subscriber's entitlement state, as seen by the usage gate.
#[derive(Debug, Clone, Serialize)]
pub struct Entitlement {
    pub plan_key: PlanKey,
    pub transformations_used: i32,
    /// Explicit quota from the subscription row; the plan default applies
    /// when absent.
    pub transformations_limit: Option<i32>,
    pub is_active: bool,
}

impl Entitlement {
    /// Default free-tier shape for an email with no subscription row.
    /// Not persisted.
    pub fn free() -> Self {
        Self {
            plan_key: PlanKey::Free,
            transformations_used: 0,
            transformations_limit: None,
            is_active: true,
        }
    }

    pub fn from_record(record: &SubscriptionRecord) -> Self {
        let plan_key = record
            .plan_key
            .as_deref()
            .and_then(PlanKey::parse)
            .unwrap_or(PlanKey::Free);
        // Anything short of an explicit cancellation still counts as usable
        let is_active = record.status.as_deref() != Some("canceled");

        Self {
            plan_key,
            transformations_used: record.transformations_used,
            transformations_limit: record.transformations_limit,
            is_active,
        }
    }

    /// Effective quota: the row's limit when present and nonzero, else the
    /// plan default.
    pub fn limit(&self) -> i32 {
        self.transformations_limit
            .filter(|limit| *limit > 0)
            .unwrap_or_else(|| self.plan_key.default_limit())
    }

    pub fn can_transform(&self) -> bool {
        self.is_active && self.transformations_used < self.limit()
    }

    pub fn remaining(&self) -> i32 {
        (self.limit() - self.transformations_used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entitlement(used: i32, limit: Option<i32>, is_active: bool) -> Entitlement {
        Entitlement {
            plan_key: PlanKey::Pro,
            transformations_used: used,
            transformations_limit: limit,
            is_active,
        }
    }

    #[test]
    fn exhausted_quota_blocks_transform() {
        assert!(!entitlement(3, Some(3), true).can_transform());
    }

    #[test]
    fn inactive_subscription_blocks_transform() {
        assert!(!entitlement(0, Some(10), false).can_transform());
    }

    #[test]
    fn active_with_headroom_allows_transform() {
        assert!(entitlement(3, Some(10), true).can_transform());
    }

    #[test]
    fn missing_limit_falls_back_to_plan_default() {
        let e = entitlement(49, None, true);
        assert_eq!(e.limit(), 50);
        assert!(e.can_transform());
        assert!(!entitlement(50, None, true).can_transform());
    }

    #[test]
    fn remaining_clamps_at_zero() {
        assert_eq!(entitlement(7, Some(5), true).remaining(), 0);
        assert_eq!(entitlement(2, Some(5), true).remaining(), 3);
    }

    #[test]
    fn free_default_shape() {
        let e = Entitlement::free();
        assert_eq!(e.plan_key, PlanKey::Free);
        assert_eq!(e.limit(), 3);
        assert!(e.can_transform());
    }
}
