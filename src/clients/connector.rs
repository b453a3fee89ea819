//! Connector: service of record for gateway accounts, card types and charges.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::card_type::{CardType, CardTypeList};
use crate::models::charge::{Charge, ChargeRequest, RefundRequest};
use crate::models::gateway_account::{AccountType, GatewayAccount};
use crate::models::json_patch::PatchOp;
use crate::models::stripe::{StripeAccount, StripeAccountSetup, StripeSetupStep};

/// Account fields that are switched on and off with a single JSON-patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountToggle {
    ApplePay,
    GooglePay,
    ThreeDs,
    MotoMaskCardNumber,
    MotoMaskSecurityCode,
}

impl AccountToggle {
    pub fn patch_path(&self) -> &'static str {
        match self {
            AccountToggle::ApplePay => "allow_apple_pay",
            AccountToggle::GooglePay => "allow_google_pay",
            AccountToggle::ThreeDs => "requires3ds",
            AccountToggle::MotoMaskCardNumber => "moto_mask_card_number_input",
            AccountToggle::MotoMaskSecurityCode => "moto_mask_card_security_code_input",
        }
    }

    pub fn current(&self, account: &GatewayAccount) -> bool {
        match self {
            AccountToggle::ApplePay => account.allow_apple_pay,
            AccountToggle::GooglePay => account.allow_google_pay,
            AccountToggle::ThreeDs => account.requires3ds,
            AccountToggle::MotoMaskCardNumber => account.moto_mask_card_number_input,
            AccountToggle::MotoMaskSecurityCode => account.moto_mask_card_security_code_input,
        }
    }
}

/// One method per connector endpoint used by this application.
#[async_trait]
pub trait ConnectorApi: Send + Sync {
    async fn get_account_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> Result<GatewayAccount, ClientError>;

    async fn get_account_by_service_and_type(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        account_type: AccountType,
    ) -> Result<GatewayAccount, ClientError>;

    async fn get_account(&self, ctx: &RequestContext, account_id: i64) -> Result<GatewayAccount, ClientError>;

    async fn toggle(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        toggle: AccountToggle,
        enabled: bool,
    ) -> Result<(), ClientError>;

    async fn get_all_card_types(&self, ctx: &RequestContext) -> Result<Vec<CardType>, ClientError>;

    async fn get_accepted_card_types(
        &self,
        ctx: &RequestContext,
        account_id: i64,
    ) -> Result<Vec<CardType>, ClientError>;

    async fn post_accepted_card_types(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        card_type_ids: &[String],
    ) -> Result<(), ClientError>;

    async fn get_stripe_account_setup(
        &self,
        ctx: &RequestContext,
        account_id: i64,
    ) -> Result<StripeAccountSetup, ClientError>;

    async fn set_stripe_account_setup_flag(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        step: StripeSetupStep,
    ) -> Result<(), ClientError>;

    async fn get_stripe_account(&self, ctx: &RequestContext, account_id: i64) -> Result<StripeAccount, ClientError>;

    async fn post_charge(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        request: &ChargeRequest,
    ) -> Result<Charge, ClientError>;

    async fn get_charge(&self, ctx: &RequestContext, account_id: i64, charge_id: &str) -> Result<Charge, ClientError>;

    async fn post_refund(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        charge_id: &str,
        request: &RefundRequest,
    ) -> Result<(), ClientError>;
}

#[derive(Clone)]
pub struct ConnectorClient {
    base: BaseClient,
}

impl ConnectorClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("connector", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl ConnectorApi for ConnectorClient {
    async fn get_account_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> Result<GatewayAccount, ClientError> {
        let url = self.base.url(
            "/v1/frontend/accounts/external-id/{externalId}",
            &[("externalId", external_id)],
        );
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn get_account_by_service_and_type(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        account_type: AccountType,
    ) -> Result<GatewayAccount, ClientError> {
        let url = self.base.url(
            "/v1/api/service/{serviceExternalId}/account/{accountType}",
            &[
                ("serviceExternalId", service_external_id),
                ("accountType", account_type.as_str()),
            ],
        );
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn get_account(&self, ctx: &RequestContext, account_id: i64) -> Result<GatewayAccount, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/frontend/accounts/{accountId}", &[("accountId", &id)]);
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn toggle(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        toggle: AccountToggle,
        enabled: bool,
    ) -> Result<(), ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/api/accounts/{accountId}", &[("accountId", &id)]);
        let body = vec![PatchOp::replace(toggle.patch_path(), enabled)];
        self.base
            .empty(self.base.request(ctx, Method::PATCH, &url).json(&body))
            .await
    }

    async fn get_all_card_types(&self, ctx: &RequestContext) -> Result<Vec<CardType>, ClientError> {
        let url = self.base.url("/v1/api/card-types", &[]);
        let list: CardTypeList = self.base.json(self.base.request(ctx, Method::GET, &url)).await?;
        Ok(list.card_types)
    }

    async fn get_accepted_card_types(
        &self,
        ctx: &RequestContext,
        account_id: i64,
    ) -> Result<Vec<CardType>, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/frontend/accounts/{accountId}/card-types", &[("accountId", &id)]);
        let list: CardTypeList = self.base.json(self.base.request(ctx, Method::GET, &url)).await?;
        Ok(list.card_types)
    }

    async fn post_accepted_card_types(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        card_type_ids: &[String],
    ) -> Result<(), ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/frontend/accounts/{accountId}/card-types", &[("accountId", &id)]);
        let body = json!({ "card_types": card_type_ids });
        self.base
            .empty(self.base.request(ctx, Method::POST, &url).json(&body))
            .await
    }

    async fn get_stripe_account_setup(
        &self,
        ctx: &RequestContext,
        account_id: i64,
    ) -> Result<StripeAccountSetup, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/api/accounts/{accountId}/stripe-setup", &[("accountId", &id)]);
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn set_stripe_account_setup_flag(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        step: StripeSetupStep,
    ) -> Result<(), ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/api/accounts/{accountId}/stripe-setup", &[("accountId", &id)]);
        let body = vec![PatchOp::replace(step.patch_path(), true)];
        self.base
            .empty(self.base.request(ctx, Method::PATCH, &url).json(&body))
            .await
    }

    async fn get_stripe_account(&self, ctx: &RequestContext, account_id: i64) -> Result<StripeAccount, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/api/accounts/{accountId}/stripe-account", &[("accountId", &id)]);
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn post_charge(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        request: &ChargeRequest,
    ) -> Result<Charge, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url("/v1/api/accounts/{accountId}/charges", &[("accountId", &id)]);
        self.base
            .json(self.base.request(ctx, Method::POST, &url).json(request))
            .await
    }

    async fn get_charge(&self, ctx: &RequestContext, account_id: i64, charge_id: &str) -> Result<Charge, ClientError> {
        let id = account_id.to_string();
        let url = self.base.url(
            "/v1/api/accounts/{accountId}/charges/{chargeId}",
            &[("accountId", &id), ("chargeId", charge_id)],
        );
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    async fn post_refund(
        &self,
        ctx: &RequestContext,
        account_id: i64,
        charge_id: &str,
        request: &RefundRequest,
    ) -> Result<(), ClientError> {
        let id = account_id.to_string();
        let url = self.base.url(
            "/v1/api/accounts/{accountId}/charges/{chargeId}/refunds",
            &[("accountId", &id), ("chargeId", charge_id)],
        );
        self.base
            .empty(self.base.request(ctx, Method::POST, &url).json(request))
            .await
    }
}
