use std::time::Duration;

use serde::Deserialize;

const DEV_SESSION_KEY: &str = "selfservice-development-session-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub connector_url: String,
    pub ledger_url: String,
    pub products_url: String,
    pub public_auth_url: String,
    pub webhooks_url: String,
    pub adminusers_url: String,
    pub stripe_api_url: String,
    pub stripe_api_key: String,
    /// HMAC key for the session cookie.
    pub session_key: String,
    /// Public base URL of this service, used to build return URLs.
    pub selfservice_url: String,
    /// Base of the friendly payment-link URLs, e.g. `https://products.example/redirect`.
    pub products_friendly_base_uri: String,
    /// Per-call timeout for every upstream client.
    pub http_timeout_ms: u64,
    /// Header carrying the authenticated user's external id, set by the
    /// fronting auth layer.
    pub auth_user_header: String,
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

/// Session key from `SESSION_ENCRYPTION_KEY`. Only a `development` run may
/// fall back to the built-in key.
fn session_key(value: Option<String>, env_mode: &str) -> anyhow::Result<String> {
    if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    if env_mode != "development" {
        anyhow::bail!(
            "SESSION_ENCRYPTION_KEY is not set. \
             Set a random key of at least 32 characters before running in {}.",
            env_mode
        );
    }
    tracing::warn!("SESSION_ENCRYPTION_KEY is not set, using an insecure development key");
    Ok(DEV_SESSION_KEY.to_string())
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let env_mode = std::env::var("APP_ENV")
        .or_else(|_| std::env::var("NODE_ENV"))
        .unwrap_or_else(|_| "development".into());
    let session_key = session_key(std::env::var("SESSION_ENCRYPTION_KEY").ok(), &env_mode)?;

    Ok(Config {
        port: std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9200),
        connector_url: env_or("CONNECTOR_URL", "http://localhost:9300"),
        ledger_url: env_or("LEDGER_URL", "http://localhost:10700"),
        products_url: env_or("PRODUCTS_URL", "http://localhost:18000"),
        public_auth_url: env_or("PUBLIC_AUTH_URL", "http://localhost:9600"),
        webhooks_url: env_or("WEBHOOKS_URL", "http://localhost:10600"),
        adminusers_url: env_or("ADMINUSERS_URL", "http://localhost:9700"),
        stripe_api_url: env_or("STRIPE_API_URL", "https://api.stripe.com"),
        stripe_api_key: env_or("STRIPE_ACCOUNT_API_KEY", ""),
        session_key,
        selfservice_url: env_or("SELFSERVICE_URL", "http://localhost:9200"),
        products_friendly_base_uri: env_or("PRODUCTS_FRIENDLY_BASE_URI", "http://localhost:18000/redirect"),
        http_timeout_ms: std::env::var("HTTP_CLIENT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60_000),
        auth_user_header: env_or("AUTH_USER_HEADER", "x-authenticated-user").to_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_used_when_set() {
        let key = session_key(Some("a-real-key".into()), "production").unwrap();
        assert_eq!(key, "a-real-key");
    }

    #[test]
    fn test_development_falls_back_to_dev_key() {
        assert_eq!(session_key(None, "development").unwrap(), DEV_SESSION_KEY);
        assert_eq!(session_key(Some("  ".into()), "development").unwrap(), DEV_SESSION_KEY);
    }

    #[test]
    fn test_missing_key_refused_outside_development() {
        for mode in ["production", "staging", "test"] {
            assert!(session_key(None, mode).is_err(), "{} should need a key", mode);
        }
    }
}
