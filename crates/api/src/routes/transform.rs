//! Server-side transformation endpoint
//!
//! Counts the transformation against the subscriber's quota before touching
//! the Flux API: the client-side entitlement check is advisory, this is the
//! enforcement point.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use snapsuit_billing::BillingError;

use crate::error::ApiError;
use crate::flux::FluxError;
use crate::routes::subscription::require_email;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub email: Option<String>,
    pub image_base64: String,
}

/// POST /api/transform
pub async fn transform(
    State(state): State<AppState>,
    Json(request): Json<TransformRequest>,
) -> Result<Json<Value>, ApiError> {
    let flux = state.flux.clone().ok_or(ApiError::TransformUnavailable)?;
    let email = require_email(request.email)?;

    // Quota is counted up front; a failed Flux job still consumed a slot in
    // the original integration, and we keep that behavior
    let subscription = match state.repo.increment_usage(&email).await {
        Ok(record) => Some(record),
        Err(BillingError::StoreNotConfigured) => {
            tracing::warn!("store not configured - transformation not counted against quota");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let started = std::time::Instant::now();
    let output = flux.transform(&request.image_base64).await.map_err(|e| match e {
        FluxError::Job(message) => ApiError::Upstream(message),
        FluxError::Timeout => ApiError::Upstream("transformation timed out".to_string()),
        FluxError::Http(e) => ApiError::Upstream(e.to_string()),
    })?;

    tracing::info!(
        job_id = %output.job_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "transformation completed"
    );

    Ok(Json(json!({
        "job_id": output.job_id,
        "image_url": output.image_url,
        "transformations_used": subscription.as_ref().map(|s| s.transformations_used),
        "transformations_limit": subscription.as_ref().and_then(|s| s.transformations_limit),
    })))
}
