//! Freemius webhook processing
//!
//! Orchestrates the reconciliation pipeline for one inbound event:
//! signature verification against the raw body, payload normalization,
//! status resolution, and idempotent persistence. Every failure along the
//! way is absorbed and logged; the provider always gets an acknowledgment
//! (returning errors would trigger its retry storm while the integration is
//! mid-configuration).

use serde::Serialize;
use serde_json::Value;

use crate::normalize::{self, NormalizedEvent};
use crate::plans;
use crate::repository::{NewSubscription, SubscriptionRepository};
use crate::signature;
use crate::status;

/// Acknowledgment reported back to the provider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    pub verified: bool,
}

/// Stateless webhook pipeline: shared secret plus the subscription store.
#[derive(Clone)]
pub struct WebhookProcessor {
    secret: Option<String>,
    repo: SubscriptionRepository,
}

impl WebhookProcessor {
    pub fn new(secret: Option<String>, repo: SubscriptionRepository) -> Self {
        if secret.is_none() {
            tracing::warn!(
                "webhook secret not configured - all events will be reported unverified"
            );
        }
        Self { secret, repo }
    }

    /// Process one raw webhook delivery.
    ///
    /// `raw_body` must be the unparsed request bytes; the signature covers
    /// them exactly. A malformed body is treated as an empty object rather
    /// than an error so normalization still runs and the delivery is logged.
    pub async fn process(
        &self,
        raw_body: &[u8],
        provided_signature: Option<&str>,
    ) -> WebhookOutcome {
        let verified = match (&self.secret, provided_signature) {
            (Some(secret), Some(sig)) => signature::verify(raw_body, sig, secret),
            _ => false,
        };

        let payload: Value = serde_json::from_slice(raw_body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed webhook body - treating as empty payload");
            Value::Object(Default::default())
        });

        let record = reconcile(&payload);

        tracing::info!(
            verified,
            event = %event_name(&payload),
            status = %record.status,
            user_email = ?record.user_email,
            subscription_id = ?record.subscription_id,
            license_id = ?record.license_id,
            plan_id = %record.plan_id,
            "freemius webhook received"
        );

        if !verified {
            tracing::warn!("webhook signature verification failed - skipping persistence");
            return WebhookOutcome {
                received: true,
                verified: false,
            };
        }

        self.repo.upsert(&record).await;

        WebhookOutcome {
            received: true,
            verified: true,
        }
    }
}

/// Derive the subscription state a payload implies. Pure apart from logging;
/// exposed separately from [`WebhookProcessor::process`] so the mapping can
/// be exercised without a store.
pub fn reconcile(payload: &Value) -> NewSubscription {
    let NormalizedEvent {
        event_name,
        identifiers,
    } = normalize::normalize(payload);
    let event_lower = event_name.to_lowercase();

    let plan = plans::lookup(&identifiers.plan_id);
    if plan.is_none() && !identifiers.plan_id.is_empty() {
        tracing::warn!(plan_id = %identifiers.plan_id, "unmapped plan id on webhook event");
    }

    let resolved = status::resolve(&event_lower, payload, plan);

    NewSubscription {
        user_email: identifiers.user_email,
        user_id: identifiers.user_id,
        license_id: identifiers.license_id,
        subscription_id: identifiers.subscription_id,
        plan_id: identifiers.plan_id,
        plan_key: plan.map(|p| p.key),
        status: resolved.status,
        renews_at: resolved.renews_at,
        transformations_limit: resolved.transformations_limit,
        raw_payload: payload.clone(),
    }
}

fn event_name(payload: &Value) -> String {
    normalize::normalize(payload).event_name
}
