use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::services::card_types::{acceptable_ids, build_view, selected_ids};
use crate::AppState;

pub const NO_CARD_SELECTED_MESSAGE: &str = "You must choose at least one card";
pub const CARD_TYPES_UPDATED_MESSAGE: &str = "Accepted card types have been updated";

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<View, AppError> {
    req.require(permission::PAYMENT_TYPES_READ)?;
    let account_id = req.account.gateway_account_id;
    let all = state.connector.get_all_card_types(&ctx).await?;
    let accepted = state.connector.get_accepted_card_types(&ctx, account_id).await?;

    Ok(View::new(
        "card-payments/card-types",
        json!({
            "cardTypes": build_view(&all, &accepted, &req.account),
            "isAccountLive": req.account.is_live(),
            "requires3ds": req.account.requires3ds,
            "formAction": req.path("card-types"),
            "canUpdate": req
                .user
                .has_permission(&req.service.external_id, permission::PAYMENT_TYPES_UPDATE),
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    body: Bytes,
) -> Result<Response, AppError> {
    req.require(permission::PAYMENT_TYPES_UPDATE)?;
    let redirect = Redirect::to(&req.path("card-types")).into_response();

    let selected = selected_ids(&body);
    if selected.is_empty() {
        session.flash(FLASH_ERROR, NO_CARD_SELECTED_MESSAGE);
        return Ok(redirect);
    }

    let all = state.connector.get_all_card_types(&ctx).await?;
    let ids = acceptable_ids(&selected, &all, &req.account);
    if ids.is_empty() {
        session.flash(FLASH_ERROR, NO_CARD_SELECTED_MESSAGE);
        return Ok(redirect);
    }

    state
        .connector
        .post_accepted_card_types(&ctx, req.account.gateway_account_id, &ids)
        .await?;
    tracing::info!(
        gateway_account_id = req.account.gateway_account_id,
        card_types = ids.len(),
        "updated accepted card types"
    );
    session.flash(FLASH_GENERIC, CARD_TYPES_UPDATED_MESSAGE);
    Ok(redirect)
}
