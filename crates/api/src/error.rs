//! API error responses
//!
//! Only the client-facing usage API surfaces conventional HTTP error codes.
//! The webhook endpoint never maps failures through this type: its contract
//! is the always-200 acknowledgment (see `routes::webhook`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use snapsuit_billing::BillingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("email required")]
    MissingEmail,

    #[error("subscription not found")]
    NotFound,

    #[error("usage limit reached")]
    QuotaExceeded,

    #[error("transformation service not configured")]
    TransformUnavailable,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingEmail => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::QuotaExceeded => StatusCode::FORBIDDEN,
            ApiError::TransformUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::SubscriptionNotFound(_) => ApiError::NotFound,
            BillingError::QuotaExceeded { .. } => ApiError::QuotaExceeded,
            BillingError::Database(message) => ApiError::Internal(message),
            BillingError::StoreNotConfigured => {
                ApiError::Internal("subscription store not configured".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_errors_map_to_expected_statuses() {
        let cases = [
            (
                BillingError::SubscriptionNotFound("a@b.com".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                BillingError::QuotaExceeded { used: 15, limit: 15 },
                StatusCode::FORBIDDEN,
            ),
            (
                BillingError::Database("connection refused".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn missing_email_is_bad_request() {
        assert_eq!(ApiError::MissingEmail.status(), StatusCode::BAD_REQUEST);
    }
}
