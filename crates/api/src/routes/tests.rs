// Test file - these are expected patterns in test code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Router-level tests
//!
//! Exercise the HTTP surface against an unconfigured store: webhook
//! acknowledgment semantics, the strict-verification flag, and the usage
//! API's conventional error codes.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use snapsuit_billing::signature;

use crate::config::Config;
use crate::routes::create_router;
use crate::state::AppState;

const SECRET: &str = "whsec_router_test";

fn test_config(strict: bool) -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        webhook_secret: Some(SECRET.to_string()),
        database_url: None,
        subscriptions_table: "subscriptions".to_string(),
        cors_origin: "*".to_string(),
        strict_webhook_errors: strict,
        flux_api_base: None,
        flux_api_key: None,
    }
}

fn app(strict: bool) -> Router {
    create_router(AppState::new(None, test_config(strict)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn webhook_request(body: &'static [u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/freemius/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sig) = signature {
        builder = builder.header("x-freemius-signature", sig);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn health_check() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn webhook_valid_signature_is_verified() {
    let body: &[u8] =
        br#"{"event":"payment.completed","subscription":{"id":"S1"},"plan_id":"33343","user":{"email":"u@x.com"}}"#;
    let sig = signature::sign(body, SECRET).unwrap();

    let (status, json) = send(app(false), webhook_request(body, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);
    assert_eq!(json["verified"], true);
}

#[tokio::test]
async fn webhook_bad_signature_still_returns_200() {
    let body: &[u8] = br#"{"event":"payment.completed"}"#;
    let (status, json) = send(app(false), webhook_request(body, Some("bogus"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);
    assert_eq!(json["verified"], false);
}

#[tokio::test]
async fn webhook_missing_signature_still_returns_200() {
    let (status, json) = send(app(false), webhook_request(br#"{}"#, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["verified"], false);
}

#[tokio::test]
async fn strict_flag_turns_unverified_into_401() {
    let body: &[u8] = br#"{"event":"payment.completed"}"#;
    let (status, json) = send(app(true), webhook_request(body, Some("bogus"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["verified"], false);

    // Verified deliveries are unaffected by the flag
    let sig = signature::sign(body, SECRET).unwrap();
    let (status, json) = send(app(true), webhook_request(body, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["verified"], true);
}

#[tokio::test]
async fn webhook_rejects_non_post() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/freemius/webhook")
        .body(Body::empty())
        .unwrap();
    let response = app(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers().get(header::ALLOW).unwrap();
    assert!(allow.to_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn subscription_query_requires_email() {
    let request = Request::builder()
        .uri("/api/subscription")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email required");
}

#[tokio::test]
async fn subscription_query_with_unconfigured_store_is_empty() {
    let request = Request::builder()
        .uri("/api/subscription?email=u@x.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn increment_requires_email() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/subscription/increment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{}"#))
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email required");
}

#[tokio::test]
async fn increment_with_unconfigured_store_is_empty() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/subscription/increment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"u@x.com"}"#))
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn transform_without_flux_config_is_unavailable() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/transform")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"u@x.com","image_base64":"aGVsbG8="}"#))
        .unwrap();
    let (status, body) = send(app(false), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "transformation service not configured");
}
