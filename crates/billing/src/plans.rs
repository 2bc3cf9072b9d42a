//! Plan table
//!
//! Maps Freemius plan ids to internal plan keys and transformation quotas.
//! The table is compiled in and immutable at runtime.

use serde::{Deserialize, Serialize};

/// Monthly transformation quota for users with no paid plan on record.
pub const FREE_TRANSFORMATIONS_LIMIT: i32 = 3;

/// Internal plan identity, decoupled from the provider-side plan id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKey {
    Starter,
    Pro,
    Premium,
    Free,
}

impl PlanKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKey::Starter => "starter",
            PlanKey::Pro => "pro",
            PlanKey::Premium => "premium",
            PlanKey::Free => "free",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(PlanKey::Starter),
            "pro" => Some(PlanKey::Pro),
            "premium" => Some(PlanKey::Premium),
            "free" => Some(PlanKey::Free),
            _ => None,
        }
    }

    /// Quota used when a subscription row carries no explicit limit.
    /// Paid-plan defaults come from the plan table; the free tier has no
    /// table entry.
    pub fn default_limit(&self) -> i32 {
        PLAN_TABLE
            .iter()
            .find(|plan| plan.key == *self)
            .map(|plan| plan.transformations_limit)
            .unwrap_or(FREE_TRANSFORMATIONS_LIMIT)
    }
}

impl std::fmt::Display for PlanKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entitlement metadata for one provider plan id.
#[derive(Debug, Clone, Copy)]
pub struct PlanDescriptor {
    pub plan_id: &'static str,
    pub key: PlanKey,
    pub transformations_limit: i32,
}

/// Freemius plan ids for the live product.
static PLAN_TABLE: &[PlanDescriptor] = &[
    PlanDescriptor {
        plan_id: "33343",
        key: PlanKey::Starter,
        transformations_limit: 15,
    },
    PlanDescriptor {
        plan_id: "33378",
        key: PlanKey::Pro,
        transformations_limit: 50,
    },
    PlanDescriptor {
        plan_id: "33379",
        key: PlanKey::Premium,
        transformations_limit: 100,
    },
];

/// Look up a provider plan id. The empty string (absent plan id) never
/// matches.
pub fn lookup(plan_id: &str) -> Option<&'static PlanDescriptor> {
    if plan_id.is_empty() {
        return None;
    }
    PLAN_TABLE.iter().find(|plan| plan.plan_id == plan_id)
}
