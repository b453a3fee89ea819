//! Webhooks service: merchant callback subscriptions and delivery history.

use std::time::Duration;

use reqwest::Method;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::json_patch::PatchOp;
use crate::models::webhook::{CreateWebhookRequest, SigningSecret, Webhook, WebhookMessagePage};

#[derive(Clone)]
pub struct WebhooksClient {
    base: BaseClient,
}

impl WebhooksClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("webhooks", base_url, timeout)?,
        })
    }

    pub async fn list_webhooks(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        gateway_account_id: i64,
        live: bool,
    ) -> Result<Vec<Webhook>, ClientError> {
        let url = self.base.url("/v1/webhook", &[]);
        let req = self.base.request(ctx, Method::GET, &url).query(&[
            ("service_id", service_external_id.to_string()),
            ("gateway_account_id", gateway_account_id.to_string()),
            ("live", live.to_string()),
        ]);
        self.base.json(req).await
    }

    pub async fn get_webhook(
        &self,
        ctx: &RequestContext,
        webhook_id: &str,
        service_external_id: &str,
        gateway_account_id: i64,
    ) -> Result<Webhook, ClientError> {
        let url = self.base.url("/v1/webhook/{webhookId}", &[("webhookId", webhook_id)]);
        let req = self.base.request(ctx, Method::GET, &url).query(&[
            ("service_id", service_external_id.to_string()),
            ("gateway_account_id", gateway_account_id.to_string()),
        ]);
        self.base.json(req).await
    }

    pub async fn create_webhook(
        &self,
        ctx: &RequestContext,
        request: &CreateWebhookRequest,
    ) -> Result<Webhook, ClientError> {
        let url = self.base.url("/v1/webhook", &[]);
        self.base
            .json(self.base.request(ctx, Method::POST, &url).json(request))
            .await
    }

    pub async fn update_webhook(
        &self,
        ctx: &RequestContext,
        webhook_id: &str,
        service_external_id: &str,
        gateway_account_id: i64,
        ops: &[PatchOp],
    ) -> Result<Webhook, ClientError> {
        let url = self.base.url("/v1/webhook/{webhookId}", &[("webhookId", webhook_id)]);
        let req = self
            .base
            .request(ctx, Method::PATCH, &url)
            .query(&[
                ("service_id", service_external_id.to_string()),
                ("gateway_account_id", gateway_account_id.to_string()),
            ])
            .json(ops);
        self.base.json(req).await
    }

    pub async fn get_signing_secret(
        &self,
        ctx: &RequestContext,
        webhook_id: &str,
        service_external_id: &str,
        gateway_account_id: i64,
    ) -> Result<SigningSecret, ClientError> {
        let url = self.base.url("/v1/webhook/{webhookId}/signing-key", &[("webhookId", webhook_id)]);
        let req = self.base.request(ctx, Method::GET, &url).query(&[
            ("service_id", service_external_id.to_string()),
            ("gateway_account_id", gateway_account_id.to_string()),
        ]);
        self.base.json(req).await
    }

    pub async fn list_messages(
        &self,
        ctx: &RequestContext,
        webhook_id: &str,
        page: u64,
        status: Option<&str>,
    ) -> Result<WebhookMessagePage, ClientError> {
        let url = self.base.url("/v1/webhook/{webhookId}/message", &[("webhookId", webhook_id)]);
        let mut query = vec![("page", page.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_uppercase()));
        }
        let req = self.base.request(ctx, Method::GET, &url).query(&query);
        self.base.json(req).await
    }
}
