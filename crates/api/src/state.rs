//! Application state

use sqlx::PgPool;

use snapsuit_billing::{SubscriptionRepository, WebhookProcessor};

use crate::config::Config;
use crate::flux::FluxClient;

/// Shared application state, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repo: SubscriptionRepository,
    pub processor: WebhookProcessor,
    /// Flux client (None when the transformation API is not configured)
    pub flux: Option<FluxClient>,
}

impl AppState {
    pub fn new(pool: Option<PgPool>, config: Config) -> Self {
        if pool.is_none() {
            tracing::warn!(
                "subscription store not configured - webhook persistence degraded to logged no-ops"
            );
        }
        let repo = SubscriptionRepository::new(pool, config.subscriptions_table.clone());
        let processor = WebhookProcessor::new(config.webhook_secret.clone(), repo.clone());

        let flux = FluxClient::from_config(config.flux_api_base.clone(), config.flux_api_key.clone());
        if flux.is_some() {
            tracing::info!("Flux transformation client initialized");
        } else {
            tracing::warn!(
                "Flux transformation not configured (missing FLUX_API_BASE_URL or FLUX_API_KEY)"
            );
        }

        Self {
            config,
            repo,
            processor,
            flux,
        }
    }
}
