//! Ledger: read-only history of transactions and agreements.

use std::time::Duration;

use reqwest::Method;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::agreement::Agreement;
use crate::models::transaction::{SearchResults, Transaction, TransactionEvents};

/// Query parameters for a ledger search, in the order they are sent.
pub type QueryPairs = Vec<(String, String)>;

#[derive(Clone)]
pub struct LedgerClient {
    base: BaseClient,
}

impl LedgerClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("ledger", base_url, timeout)?,
        })
    }

    pub async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
        account_id: i64,
    ) -> Result<Transaction, ClientError> {
        let url = self.base.url(
            "/v1/transaction/{transactionId}",
            &[("transactionId", transaction_id)],
        );
        let req = self
            .base
            .request(ctx, Method::GET, &url)
            .query(&[("account_id", account_id.to_string())]);
        self.base.json(req).await
    }

    pub async fn get_transaction_events(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
        account_id: i64,
    ) -> Result<TransactionEvents, ClientError> {
        let url = self.base.url(
            "/v1/transaction/{transactionId}/event",
            &[("transactionId", transaction_id)],
        );
        let req = self
            .base
            .request(ctx, Method::GET, &url)
            .query(&[("gateway_account_id", account_id.to_string())]);
        self.base.json(req).await
    }

    /// Search transactions for one gateway account.
    ///
    /// `filters` comes from the transaction filter view model and is passed
    /// through unchanged after the account and paging parameters.
    pub async fn search_transactions(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        filters: &QueryPairs,
        page: u64,
        display_size: u64,
    ) -> Result<SearchResults<Transaction>, ClientError> {
        let url = self.base.url("/v1/transaction", &[]);
        let mut query: QueryPairs = vec![
            ("account_id".into(), account_id.to_string()),
            ("page".into(), page.to_string()),
            ("display_size".into(), display_size.to_string()),
        ];
        query.extend(filters.iter().cloned());
        let req = self.base.request(ctx, Method::GET, &url).query(&query);
        self.base.json(req).await
    }

    pub async fn search_agreements(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        live: bool,
        filters: &QueryPairs,
        page: u64,
        display_size: u64,
    ) -> Result<SearchResults<Agreement>, ClientError> {
        let url = self.base.url("/v1/agreement", &[]);
        let mut query: QueryPairs = vec![
            ("service_id".into(), service_external_id.to_string()),
            ("live".into(), live.to_string()),
            ("page".into(), page.to_string()),
            ("display_size".into(), display_size.to_string()),
        ];
        query.extend(filters.iter().cloned());
        let req = self.base.request(ctx, Method::GET, &url).query(&query);
        self.base.json(req).await
    }

    pub async fn get_agreement(
        &self,
        ctx: &RequestContext,
        agreement_id: &str,
        service_external_id: &str,
    ) -> Result<Agreement, ClientError> {
        let url = self.base.url("/v1/agreement/{agreementId}", &[("agreementId", agreement_id)]);
        let req = self
            .base
            .request(ctx, Method::GET, &url)
            .query(&[("service_id", service_external_id)]);
        self.base.json(req).await
    }
}
