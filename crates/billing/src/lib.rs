// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Snapsuit Billing Module
//!
//! Reconciles Freemius billing webhooks into local subscription records and
//! gates transformation usage by plan entitlement.
//!
//! ## Pipeline
//!
//! - **Signature verification**: HMAC-SHA256 over the raw request body,
//!   constant-time compare
//! - **Normalization**: canonical event name + identifiers from
//!   loosely-structured payloads
//! - **Status resolution**: provider event vocabulary to internal status,
//!   renewal and quota metadata
//! - **Persistence**: idempotent upsert with natural-key fallback
//! - **Entitlement**: per-plan transformation quota checks

pub mod entitlement;
pub mod error;
pub mod normalize;
pub mod plans;
pub mod repository;
pub mod signature;
pub mod status;
pub mod webhooks;

// Entitlement
pub use entitlement::Entitlement;

// Error
pub use error::{BillingError, BillingResult};

// Normalize
pub use normalize::{Identifiers, NormalizedEvent};

// Plans
pub use plans::{PlanDescriptor, PlanKey, FREE_TRANSFORMATIONS_LIMIT};

// Repository
pub use repository::{NewSubscription, SubscriptionRecord, SubscriptionRepository};

// Signature
pub use signature::SIGNATURE_HEADERS;

// Status
pub use status::{ResolvedStatus, SubscriptionStatus};

// Webhooks
pub use webhooks::{WebhookOutcome, WebhookProcessor};
