//! Payments self-service admin.
//!
//! Resolves the gateway account and service a request is about, calls the
//! backend services that own the data, and answers with a view model
//! (template name plus context) or a redirect.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod services;

use clients::adminusers::AdminUsersClient;
use clients::connector::{ConnectorApi, ConnectorClient};
use clients::ledger::LedgerClient;
use clients::products::ProductsClient;
use clients::publicauth::PublicAuthClient;
use clients::stripe::StripeClient;
use clients::webhooks::WebhooksClient;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub config: config::Config,
    pub connector: Arc<dyn ConnectorApi>,
    pub ledger: LedgerClient,
    pub products: ProductsClient,
    pub publicauth: PublicAuthClient,
    pub webhooks: WebhooksClient,
    pub adminusers: AdminUsersClient,
    pub stripe: StripeClient,
}

impl AppState {
    /// Build one client per backend from configuration.
    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        let timeout = config.http_timeout();
        Ok(Self {
            connector: Arc::new(ConnectorClient::new(&config.connector_url, timeout)?),
            ledger: LedgerClient::new(&config.ledger_url, timeout)?,
            products: ProductsClient::new(&config.products_url, timeout)?,
            publicauth: PublicAuthClient::new(&config.public_auth_url, timeout)?,
            webhooks: WebhooksClient::new(&config.webhooks_url, timeout)?,
            adminusers: AdminUsersClient::new(&config.adminusers_url, timeout)?,
            stripe: StripeClient::new(&config.stripe_api_url, &config.stripe_api_key, timeout)?,
            config,
        })
    }
}
