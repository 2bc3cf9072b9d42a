//! Route handlers and router assembly

pub mod subscription;
pub mod transform;
pub mod webhook;

#[cfg(test)]
mod tests;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/freemius/webhook", post(webhook::freemius_webhook))
        .route("/api/subscription", get(subscription::get_subscription))
        .route(
            "/api/subscription/increment",
            post(subscription::increment_usage),
        )
        .route("/api/transform", post(transform::transform))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}
