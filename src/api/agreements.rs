//! Recurring-payment agreements for the service's test or live account.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::path_param;
use super::view::View;
use crate::clients::ledger::QueryPairs;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::models::agreement::AGREEMENT_STATUSES;
use crate::services::pagination::{Pagination, DEFAULT_DISPLAY_SIZE};
use crate::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AgreementFilters {
    pub status: Option<String>,
    pub reference: Option<String>,
    pub page: Option<u64>,
}

impl AgreementFilters {
    fn to_ledger_query(&self) -> QueryPairs {
        let mut query = QueryPairs::new();
        if let Some(status) = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| AGREEMENT_STATUSES.contains(s))
        {
            query.push(("status".into(), status.to_uppercase()));
        }
        if let Some(reference) = self.reference.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            query.push(("reference".into(), reference.to_string()));
        }
        query
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    req: AccountRequest,
    Query(filters): Query<AgreementFilters>,
) -> Result<View, AppError> {
    req.require(permission::AGREEMENTS_READ)?;
    let page = filters.page.filter(|p| *p > 0).unwrap_or(1);
    let results = state
        .ledger
        .search_agreements(
            &ctx,
            &req.service.external_id,
            req.account.is_live(),
            &filters.to_ledger_query(),
            page,
            DEFAULT_DISPLAY_SIZE,
        )
        .await?;

    Ok(View::new(
        "agreements/index",
        json!({
            "agreements": results.results,
            "total": results.total,
            "filters": &filters,
            "statuses": AGREEMENT_STATUSES,
            "pagination": Pagination::new(results.total, results.page, DEFAULT_DISPLAY_SIZE),
        }),
    ))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<View, AppError> {
    req.require(permission::AGREEMENTS_READ)?;
    let agreement_id = path_param(&params, "agreementId")?;
    let agreement = state
        .ledger
        .get_agreement(&ctx, agreement_id, &req.service.external_id)
        .await?;

    Ok(View::new(
        "agreements/detail",
        json!({
            "agreement": agreement,
            "transactionsLink": req.path(&format!("transactions?agreementId={}", urlencoding::encode(agreement_id))),
        }),
    ))
}
