//! Subscription query and usage endpoints
//!
//! Unlike the webhook path, these surface conventional HTTP error codes to
//! the client application. An unconfigured store returns empty results, not
//! errors.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use snapsuit_billing::{BillingError, SubscriptionRecord};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    pub email: Option<String>,
}

/// GET /api/subscription?email=
pub async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<Value>, ApiError> {
    let email = require_email(query.email)?;

    match state.repo.get_by_email(&email).await.map_err(ApiError::from)? {
        Some(record) => Ok(Json(to_json(&record)?)),
        None => Ok(Json(json!({}))),
    }
}

/// POST /api/subscription/increment
///
/// The authoritative quota check: counts one transformation or rejects with
/// 403 when the quota is exhausted, 404 when no subscription exists.
pub async fn increment_usage(
    State(state): State<AppState>,
    Json(request): Json<IncrementRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = require_email(request.email)?;

    match state.repo.increment_usage(&email).await {
        Ok(record) => Ok(Json(to_json(&record)?)),
        // Same degraded shape as reads when the store is unconfigured
        Err(BillingError::StoreNotConfigured) => Ok(Json(json!({}))),
        Err(e) => Err(e.into()),
    }
}

/// Emails are stored lower-cased; blank counts as missing.
pub(crate) fn require_email(email: Option<String>) -> Result<String, ApiError> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or(ApiError::MissingEmail)
}

fn to_json(record: &SubscriptionRecord) -> Result<Value, ApiError> {
    serde_json::to_value(record).map_err(|e| ApiError::Internal(e.to_string()))
}
