//! Products: payment links.

use std::time::Duration;

use reqwest::Method;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::product::{CreateProductRequest, Product};

#[derive(Clone)]
pub struct ProductsClient {
    base: BaseClient,
}

impl ProductsClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("products", base_url, timeout)?,
        })
    }

    pub async fn create_product(
        &self,
        ctx: &RequestContext,
        request: &CreateProductRequest,
    ) -> Result<Product, ClientError> {
        let url = self.base.url("/v1/api/products", &[]);
        self.base
            .json(self.base.request(ctx, Method::POST, &url).json(request))
            .await
    }

    /// Payment links (ADHOC products) for a gateway account.
    pub async fn list_payment_links(&self, ctx: &RequestContext, account_id: i64) -> Result<Vec<Product>, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url(
            "/v1/api/gateway-account/{gatewayAccountId}/products",
            &[("gatewayAccountId", &id)],
        );
        let req = self
            .base
            .request(ctx, Method::GET, &url)
            .query(&[("type", "ADHOC")]);
        self.base.json(req).await
    }

    pub async fn get_product(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        product_external_id: &str,
    ) -> Result<Product, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url(
            "/v1/api/gateway-account/{gatewayAccountId}/products/{productExternalId}",
            &[("gatewayAccountId", &id), ("productExternalId", product_external_id)],
        );
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    pub async fn delete_product(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        product_external_id: &str,
    ) -> Result<(), ClientError> {
        let id = account_id.to_string();
        let url = self.base.url(
            "/v1/api/gateway-account/{gatewayAccountId}/products/{productExternalId}",
            &[("gatewayAccountId", &id), ("productExternalId", product_external_id)],
        );
        self.base.empty(self.base.request(ctx, Method::DELETE, &url)).await
    }
}
