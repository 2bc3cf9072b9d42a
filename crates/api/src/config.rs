//! Environment configuration
//!
//! Read once at startup and treated as immutable afterwards. Missing store
//! credentials are not a startup failure: persistence degrades to logged
//! no-ops so the webhook endpoint can be configured before the database is.

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Freemius webhook shared secret; absent means every event is reported
    /// unverified.
    pub webhook_secret: Option<String>,
    pub database_url: Option<String>,
    pub subscriptions_table: String,
    pub cors_origin: String,
    /// When set, a failed signature verification returns 401 instead of the
    /// always-200 acknowledgment (re-enables provider-driven retries).
    pub strict_webhook_errors: bool,
    pub flux_api_base: Option<String>,
    pub flux_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let subscriptions_table =
            env_opt(&["SUBSCRIPTIONS_TABLE"]).unwrap_or_else(|| "subscriptions".to_string());
        // The table name is interpolated into SQL, so restrict it to
        // identifier characters
        if !is_identifier(&subscriptions_table) {
            anyhow::bail!(
                "SUBSCRIPTIONS_TABLE must contain only letters, digits and underscores, got {:?}",
                subscriptions_table
            );
        }

        Ok(Self {
            bind_address: env_opt(&["BIND_ADDRESS"]).unwrap_or_else(|| "0.0.0.0:3001".to_string()),
            webhook_secret: env_opt(&["FREEMIUS_WEBHOOK_SECRET", "VITE_FREEMIUS_SECRET_KEY"]),
            database_url: env_opt(&["DATABASE_URL"]),
            subscriptions_table,
            cors_origin: env_opt(&["CORS_ORIGIN"]).unwrap_or_else(|| "*".to_string()),
            strict_webhook_errors: env_flag("STRICT_WEBHOOK_ERRORS"),
            flux_api_base: env_opt(&["FLUX_API_BASE_URL"]),
            flux_api_key: env_opt(&["FLUX_API_KEY"]),
        })
    }
}

/// First non-empty value among the given environment variables.
fn env_opt(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
