//! Freemius webhook endpoint
//!
//! The handler takes the raw body bytes before any JSON parsing: the
//! signature covers the exact byte sequence the provider sent, and
//! re-serializing parsed JSON would break verification silently.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use snapsuit_billing::SIGNATURE_HEADERS;

use crate::state::AppState;

/// POST /freemius/webhook
///
/// Always answers 200 with `{ received, verified }` so a misconfigured
/// secret does not trigger the provider's retry storm; verification failures
/// are observable via the `verified` flag and server logs. Setting
/// STRICT_WEBHOOK_ERRORS flips unverified deliveries to 401 once the
/// integration is stable.
pub async fn freemius_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = signature_from_headers(&headers);
    let outcome = state.processor.process(&body, signature.as_deref()).await;

    let status = if !outcome.verified && state.config.strict_webhook_errors {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };

    (status, Json(outcome)).into_response()
}

/// First non-empty signature across the header names the provider has used.
fn signature_from_headers(headers: &HeaderMap) -> Option<String> {
    SIGNATURE_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    })
}
