//! PSP integration check: a small real payment through the account's
//! payment service provider.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR};
use crate::models::charge::ChargeRequest;
use crate::AppState;

pub const TEST_PAYMENT_AMOUNT: u64 = 200;
pub const TEST_PAYMENT_DESCRIPTION: &str = "Payment to verify PSP integration";
pub const NO_TEST_PAYMENT_MESSAGE: &str = "No test payment in progress. Start a new one.";

pub async fn index(req: AccountRequest, session: Session) -> Result<View, AppError> {
    req.require(permission::MAKE_DEMO_PAYMENT)?;
    Ok(View::new(
        "test-payment/index",
        json!({
            "amount": TEST_PAYMENT_AMOUNT,
            "paymentProvider": req.account.payment_provider,
            "formAction": req.path("test-payment"),
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    req.require(permission::MAKE_DEMO_PAYMENT)?;
    let account_id = req.account.gateway_account_id;

    let request = ChargeRequest {
        amount: TEST_PAYMENT_AMOUNT,
        description: TEST_PAYMENT_DESCRIPTION.to_string(),
        reference: "VERIFY PSP INTEGRATION".to_string(),
        return_url: format!(
            "{}{}",
            state.config.selfservice_url.trim_end_matches('/'),
            req.path("test-payment/callback")
        ),
    };
    let charge = state.connector.post_charge(&ctx, account_id, &request).await?;
    let next_url = charge.next_url().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "charge {} was created without a next_url link",
            charge.charge_id
        ))
    })?;

    session.set_test_payment_charge(&req.account.external_id, &charge.charge_id);
    tracing::info!(
        gateway_account_id = account_id,
        charge_id = %charge.charge_id,
        "started PSP test payment"
    );
    Ok(Redirect::to(next_url).into_response())
}

pub async fn callback(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    req.require(permission::MAKE_DEMO_PAYMENT)?;
    let Some(charge_id) = session.take_test_payment_charge(&req.account.external_id) else {
        session.flash(FLASH_ERROR, NO_TEST_PAYMENT_MESSAGE);
        return Ok(Redirect::to(&req.path("test-payment")).into_response());
    };

    let charge = state
        .connector
        .get_charge(&ctx, req.account.gateway_account_id, &charge_id)
        .await?;
    tracing::info!(
        gateway_account_id = req.account.gateway_account_id,
        charge_id = %charge_id,
        status = %charge.state.status,
        "PSP test payment returned"
    );

    let template = if charge.succeeded() {
        "test-payment/success"
    } else {
        "test-payment/failure"
    };
    Ok(View::new(
        template,
        json!({
            "chargeId": charge.charge_id,
            "status": charge.state.status,
            "code": charge.state.code,
            "retryAction": req.path("test-payment"),
        }),
    )
    .into_response())
}
