//! Billing error types

use thiserror::Error;

/// Errors surfaced by the billing crate.
///
/// Webhook-path failures (bad signature, malformed payload, failed upsert)
/// are intentionally NOT represented here: the webhook pipeline absorbs them
/// and reports through [`crate::WebhookOutcome`] plus log lines, so that the
/// provider always receives an acknowledgment. Only the usage API propagates
/// conventional errors to its caller.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("database error: {0}")]
    Database(String),

    #[error("no subscription found for {0}")]
    SubscriptionNotFound(String),

    #[error("usage limit reached ({used}/{limit})")]
    QuotaExceeded { used: i32, limit: i32 },

    #[error("subscription store not configured")]
    StoreNotConfigured,
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        BillingError::Database(e.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
