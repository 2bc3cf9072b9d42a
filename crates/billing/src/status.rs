//! Subscription status resolution
//!
//! Maps a normalized event name plus plan metadata to an internal status and
//! renewal/limit metadata. The mapping is deliberately tolerant: event
//! vocabulary we have never seen maps to [`SubscriptionStatus::Unknown`] and
//! the record is still persisted, so the last-event timestamp and raw payload
//! survive for audit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plans::PlanDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Refunded,
    Trialing,
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Refunded => "refunded",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Provider event vocabulary, grouped by outcome. Matching is by substring on
// the lower-cased event name; AFTER_PAYMENT_EVENT is an exact match because
// "payment" alone is too broad a substring.
const ACTIVE_EVENTS: &[&str] = &[
    "payment.completed",
    "payment.succeeded",
    "purchase.completed",
    "subscription.renewed",
    "license.renewed",
    "renewal_payment_succeeded",
    // Plan changes keep the subscription active; only plan/limit change
    "license.upgraded",
    "plan.upgraded",
    "license.downgraded",
    "plan.downgraded",
];
const AFTER_PAYMENT_EVENT: &str = "after_payment";
const CANCEL_EVENTS: &[&str] = &[
    "subscription.canceled",
    "subscription.cancelled",
    "license.canceled",
    "cancellation",
];
const REFUND_EVENTS: &[&str] = &["refund"];
const FAILURE_EVENTS: &[&str] = &[
    "payment.failed",
    "charge.failed",
    "trial.ended",
    "trial_expired",
];
const TRIAL_EVENTS: &[&str] = &["trial.started", "trial_activated", "trialing"];

const RENEWS_AT_PATHS: &[&[&str]] = &[
    &["subscription", "next_payment"],
    &["subscription", "trial_ends"],
];

/// Status and metadata derived from one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub status: SubscriptionStatus,
    /// Provider-supplied renewal timestamp, passed through verbatim.
    pub renews_at: Option<String>,
    /// Quota from the matched plan; `None` when the plan id is unmapped.
    pub transformations_limit: Option<i32>,
}

/// Classify a lower-cased event name against the known vocabularies.
///
/// Refund events are checked before generic payment failures so that
/// `payment.refunded` maps to `refunded` rather than `past_due`.
pub fn resolve(
    event_lower: &str,
    payload: &Value,
    plan: Option<&PlanDescriptor>,
) -> ResolvedStatus {
    let mut renews_at = crate::normalize::probe(payload, RENEWS_AT_PATHS);
    let transformations_limit = plan.map(|p| p.transformations_limit);

    let status = if matches_any(event_lower, ACTIVE_EVENTS) || event_lower == AFTER_PAYMENT_EVENT {
        SubscriptionStatus::Active
    } else if matches_any(event_lower, CANCEL_EVENTS) {
        SubscriptionStatus::Canceled
    } else if matches_any(event_lower, REFUND_EVENTS) {
        SubscriptionStatus::Refunded
    } else if matches_any(event_lower, FAILURE_EVENTS) {
        SubscriptionStatus::PastDue
    } else if matches_any(event_lower, TRIAL_EVENTS) {
        SubscriptionStatus::Trialing
    } else {
        SubscriptionStatus::Unknown
    };

    // A canceled subscription has no upcoming renewal
    if status == SubscriptionStatus::Canceled {
        renews_at = None;
    }

    ResolvedStatus {
        status,
        renews_at,
        transformations_limit,
    }
}

fn matches_any(event: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|name| event.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans;
    use serde_json::json;

    fn resolve_bare(event: &str) -> ResolvedStatus {
        resolve(event, &json!({}), None)
    }

    #[test]
    fn after_payment_is_active() {
        assert_eq!(resolve_bare("after_payment").status, SubscriptionStatus::Active);
    }

    #[test]
    fn payment_completed_is_active() {
        assert_eq!(
            resolve_bare("payment.completed").status,
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn renewal_payment_succeeded_is_active() {
        assert_eq!(
            resolve_bare("renewal_payment_succeeded").status,
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn cancellation_clears_renews_at() {
        let payload = json!({"subscription": {"next_payment": "2026-09-01 00:00:00"}});
        let resolved = resolve("subscription.canceled", &payload, None);
        assert_eq!(resolved.status, SubscriptionStatus::Canceled);
        assert_eq!(resolved.renews_at, None);
    }

    #[test]
    fn british_spelling_also_cancels() {
        assert_eq!(
            resolve_bare("subscription.cancelled").status,
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            resolve_bare("after_subscription_cancellation").status,
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn refund_wins_over_generic_payment_failure() {
        assert_eq!(
            resolve_bare("payment.refunded").status,
            SubscriptionStatus::Refunded
        );
        assert_eq!(resolve_bare("refund.created").status, SubscriptionStatus::Refunded);
    }

    #[test]
    fn payment_failed_is_past_due() {
        assert_eq!(
            resolve_bare("payment.failed").status,
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            resolve_bare("charge.failed").status,
            SubscriptionStatus::PastDue
        );
    }

    #[test]
    fn trial_lifecycle() {
        assert_eq!(
            resolve_bare("trial_activated").status,
            SubscriptionStatus::Trialing
        );
        assert_eq!(
            resolve_bare("trial.started").status,
            SubscriptionStatus::Trialing
        );
        assert_eq!(
            resolve_bare("trial_expired").status,
            SubscriptionStatus::PastDue
        );
        assert_eq!(resolve_bare("trial.ended").status, SubscriptionStatus::PastDue);
    }

    #[test]
    fn plan_changes_stay_active() {
        assert_eq!(
            resolve_bare("plan.upgraded").status,
            SubscriptionStatus::Active
        );
        assert_eq!(
            resolve_bare("license.downgraded").status,
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn unseen_vocabulary_is_unknown() {
        assert_eq!(resolve_bare("foo.bar").status, SubscriptionStatus::Unknown);
    }

    #[test]
    fn renews_at_falls_back_to_trial_ends() {
        let payload = json!({"subscription": {"trial_ends": "2026-09-15 00:00:00"}});
        let resolved = resolve("trial_activated", &payload, None);
        assert_eq!(resolved.renews_at.as_deref(), Some("2026-09-15 00:00:00"));
    }

    #[test]
    fn limit_comes_from_plan_table() {
        let plan = plans::lookup("33378");
        let resolved = resolve("payment.completed", &json!({}), plan);
        assert_eq!(resolved.transformations_limit, Some(50));

        let resolved = resolve("payment.completed", &json!({}), None);
        assert_eq!(resolved.transformations_limit, None);
    }
}
