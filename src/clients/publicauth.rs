//! Publicauth: issues API tokens. Used to mint the token a payment link
//! charges with.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;

#[derive(Debug, Serialize)]
struct CreateTokenRequest<'a> {
    account_id: i64,
    description: &'a str,
    created_by: &'a str,
    token_type: &'static str,
    #[serde(rename = "type")]
    token_account_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CreatedToken {
    pub token: String,
}

#[derive(Clone)]
pub struct PublicAuthClient {
    base: BaseClient,
}

impl PublicAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("publicauth", base_url, timeout)?,
        })
    }

    /// Create a card-payment token owned by the products service.
    pub async fn create_product_token(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        description: &str,
        created_by: &str,
    ) -> Result<CreatedToken, ClientError> {
        let url = self.base.url("/v1/frontend/auth", &[]);
        let body = CreateTokenRequest {
            account_id,
            description,
            created_by,
            token_type: "CARD",
            token_account_type: "PRODUCTS",
        };
        self.base
            .json(self.base.request(ctx, Method::POST, &url).json(&body))
            .await
    }
}
