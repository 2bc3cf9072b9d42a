//! Snapsuit API Server
//!
//! Receives Freemius billing webhooks, reconciles them into local
//! subscription records, and serves the subscription/usage API consumed by
//! the client application.

mod config;
mod error;
mod flux;
mod routes;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, routes::create_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snapsuit_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Snapsuit API Server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Missing store credentials degrade persistence to logged no-ops rather
    // than failing startup; an unreachable database with credentials present
    // is still fatal
    let pool = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await?;
            tracing::info!("Database connection established");
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - running without subscription persistence");
            None
        }
    };

    let state = AppState::new(pool, config.clone());

    let cors = cors_layer(&config.cors_origin)?;
    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the client application; defaults to permissive.
fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let layer = if origin == "*" {
        layer.allow_origin(Any)
    } else {
        let origin: HeaderValue = origin.parse()?;
        layer.allow_origin(origin)
    };

    Ok(layer)
}
