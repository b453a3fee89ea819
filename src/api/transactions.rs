//! Transaction search, detail and refunds.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::path_param;
use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::models::charge::RefundRequest;
use crate::services::filters::{display_states, TransactionFilters};
use crate::services::pagination::{Pagination, DEFAULT_TRANSACTIONS_DISPLAY_SIZE};
use crate::AppState;

static POUNDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").unwrap());

pub const REFUND_SUCCESS_MESSAGE: &str = "Refund successful";
pub const REFUND_AMOUNT_MESSAGE: &str = "Enter a valid refund amount";
pub const REFUND_TOO_HIGH_MESSAGE: &str = "The amount you tried to refund is greater than the amount available to be refunded";
pub const REFUND_CONFLICT_MESSAGE: &str =
    "This refund could not be processed. Check the transaction and try again.";

/// Parse an amount entered in pounds into pence.
pub fn pounds_to_pence(value: &str) -> Option<u64> {
    let v: String = value
        .trim()
        .trim_start_matches('£')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if !POUNDS.is_match(&v) {
        return None;
    }
    let (whole, frac) = v.split_once('.').unwrap_or((v.as_str(), ""));
    let whole: u64 = whole.parse().ok()?;
    let frac: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    RawQuery(query): RawQuery,
) -> Result<View, AppError> {
    req.require(permission::TRANSACTIONS_READ)?;
    let account_id = req.account.gateway_account_id;
    let filters = TransactionFilters::from_query(query.as_deref());

    let card_brands: BTreeSet<String> = match state.connector.get_all_card_types(&ctx).await {
        Ok(cards) => cards.into_iter().map(|c| c.brand).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "could not load card brands for transaction filters");
            BTreeSet::new()
        }
    };

    let base = json!({
        "filters": &filters,
        "hasFilters": filters.has_any(),
        "states": display_states(),
        "cardBrands": card_brands,
        "isLive": req.account.is_live(),
    });

    let ledger_query = match filters.to_ledger_query() {
        Ok(q) => q,
        Err(e) => {
            let mut context = base;
            context["filterError"] = json!(e.to_string());
            context["results"] = json!([]);
            return Ok(View::new("transactions/index", context).with_flash(session.take_flash()));
        }
    };

    let page = filters.page.unwrap_or(1);
    let display_size = filters.page_size.unwrap_or(DEFAULT_TRANSACTIONS_DISPLAY_SIZE);
    let results = state
        .ledger
        .search_transactions(&ctx, account_id, &ledger_query, page, display_size)
        .await?;

    let pagination = Pagination::new(results.total, results.page, display_size);
    let mut context = base;
    context["total"] = json!(results.total);
    context["results"] = json!(results.results);
    context["showPagination"] = json!(pagination.has_multiple_pages());
    context["pagination"] = json!(pagination);
    Ok(View::new("transactions/index", context).with_flash(session.take_flash()))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<View, AppError> {
    req.require(permission::TRANSACTIONS_READ)?;
    let charge_id = path_param(&params, "chargeId")?;
    let account_id = req.account.gateway_account_id;

    let transaction = state.ledger.get_transaction(&ctx, charge_id, account_id).await?;
    let events = state
        .ledger
        .get_transaction_events(&ctx, charge_id, account_id)
        .await?;

    let can_refund = req
        .user
        .has_permission(&req.service.external_id, permission::REFUNDS_CREATE);
    Ok(View::new(
        "transaction-detail/index",
        json!({
            "transaction": &transaction,
            "events": events.events,
            "refundable": transaction.refundable_amount().is_some() && can_refund,
            "refundAmountAvailable": transaction.refundable_amount().unwrap_or(0),
            "refundAction": req.path(&format!("transactions/{}/refund", charge_id)),
            "showCardDetails": req
                .user
                .has_permission(&req.service.external_id, permission::TRANSACTIONS_DETAILS_READ),
        }),
    )
    .with_flash(session.take_flash()))
}

#[derive(Debug, Deserialize)]
pub struct RefundForm {
    #[serde(rename = "refund-type")]
    pub refund_type: Option<String>,
    #[serde(rename = "refund-amount")]
    pub refund_amount: Option<String>,
    #[serde(rename = "refund-amount-available")]
    pub refund_amount_available: Option<String>,
}

pub async fn refund(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
    Form(form): Form<RefundForm>,
) -> Result<Response, AppError> {
    req.require(permission::REFUNDS_CREATE)?;
    let charge_id = path_param(&params, "chargeId")?;
    let redirect = Redirect::to(&req.path(&format!("transactions/{}", charge_id))).into_response();

    let available = form
        .refund_amount_available
        .as_deref()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::BadRequest("missing refund amount available".into()))?;

    let amount = if form.refund_type.as_deref() == Some("full") {
        available
    } else {
        match form.refund_amount.as_deref().and_then(pounds_to_pence) {
            Some(a) if a > 0 => a,
            _ => {
                session.flash(FLASH_ERROR, REFUND_AMOUNT_MESSAGE);
                return Ok(redirect);
            }
        }
    };
    if amount > available {
        session.flash(FLASH_ERROR, REFUND_TOO_HIGH_MESSAGE);
        return Ok(redirect);
    }

    let request = RefundRequest {
        amount,
        refund_amount_available: available,
        user_external_id: req.user.external_id.clone(),
        user_email: req.user.email.clone(),
    };
    match state
        .connector
        .post_refund(&ctx, req.account.gateway_account_id, charge_id, &request)
        .await
    {
        Ok(()) => {
            tracing::info!(
                gateway_account_id = req.account.gateway_account_id,
                charge_id,
                amount,
                "refund submitted"
            );
            session.flash(FLASH_GENERIC, REFUND_SUCCESS_MESSAGE);
        }
        Err(e) if e.is_client_error() && !e.is_not_found() => {
            tracing::info!(charge_id, error_code = ?e.error_code, error = %e.message, "refund rejected by connector");
            session.flash(FLASH_ERROR, REFUND_CONFLICT_MESSAGE);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(redirect)
}
