//! Account settings: digital wallets, 3DS and MOTO input masking.
//!
//! Each toggle page posts a single on/off field; the handler issues one
//! PATCH to connector and redirects back to the page with a flash message.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use super::view::View;
use crate::clients::connector::AccountToggle;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::AppState;

pub const THREE_DS_LOCKED_MESSAGE: &str = "3D Secure cannot be turned off for this payment service provider";
pub const THREE_DS_CARDS_MESSAGE: &str =
    "You cannot turn off 3D Secure while you accept card types that require it";

/// Page path and user-facing name for each toggle.
fn toggle_page(toggle: AccountToggle) -> (&'static str, &'static str) {
    match toggle {
        AccountToggle::ApplePay => ("digital-wallet/apple-pay", "Apple Pay"),
        AccountToggle::GooglePay => ("digital-wallet/google-pay", "Google Pay"),
        AccountToggle::ThreeDs => ("toggle-3ds", "3D Secure"),
        AccountToggle::MotoMaskCardNumber => ("moto-hide-card-number", "Hiding card numbers"),
        AccountToggle::MotoMaskSecurityCode => ("moto-hide-security-code", "Hiding card security codes"),
    }
}

fn template(toggle: AccountToggle) -> &'static str {
    match toggle {
        AccountToggle::ApplePay => "digital-wallet/apple-pay",
        AccountToggle::GooglePay => "digital-wallet/google-pay",
        AccountToggle::ThreeDs => "3ds/index",
        AccountToggle::MotoMaskCardNumber => "settings/moto-hide-card-number",
        AccountToggle::MotoMaskSecurityCode => "settings/moto-hide-security-code",
    }
}

fn update_permission(toggle: AccountToggle) -> &'static str {
    match toggle {
        AccountToggle::ApplePay | AccountToggle::GooglePay => permission::PAYMENT_TYPES_UPDATE,
        AccountToggle::ThreeDs => permission::TOGGLE_3DS_UPDATE,
        AccountToggle::MotoMaskCardNumber | AccountToggle::MotoMaskSecurityCode => {
            permission::MOTO_MASK_INPUT_UPDATE
        }
    }
}

fn read_permission(toggle: AccountToggle) -> &'static str {
    match toggle {
        AccountToggle::ThreeDs => permission::TOGGLE_3DS_READ,
        _ => permission::PAYMENT_TYPES_READ,
    }
}

/// `on` enables; anything else, including a missing field, disables.
fn is_on(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on") | Some("true"))
}

pub fn flash_message(toggle: AccountToggle, enabled: bool) -> String {
    let (_, name) = toggle_page(toggle);
    format!(
        "{} successfully {}.",
        name,
        if enabled { "enabled" } else { "disabled" }
    )
}

pub async fn index(req: AccountRequest, session: Session) -> Result<View, AppError> {
    let account = &req.account;
    let can = |p: &str| req.user.has_permission(&req.service.external_id, p);
    Ok(View::new(
        "settings/index",
        json!({
            "account": account,
            "isLive": req.is_live,
            "supports3ds": account.supports3ds,
            "requires3ds": account.requires3ds,
            "allowApplePay": account.allow_apple_pay,
            "allowGooglePay": account.allow_google_pay,
            "allowMoto": account.allow_moto,
            "activePaymentProvider": account
                .active_credential()
                .map(|c| c.payment_provider.as_str())
                .unwrap_or(account.payment_provider.as_str()),
            "motoMaskCardNumber": account.moto_mask_card_number_input,
            "motoMaskSecurityCode": account.moto_mask_card_security_code_input,
            "permissions": {
                "paymentTypesUpdate": can(permission::PAYMENT_TYPES_UPDATE),
                "toggle3dsUpdate": can(permission::TOGGLE_3DS_UPDATE),
                "motoMaskInputUpdate": can(permission::MOTO_MASK_INPUT_UPDATE),
            },
        }),
    )
    .with_flash(session.take_flash()))
}

fn render_toggle(req: &AccountRequest, session: &Session, toggle: AccountToggle) -> Result<View, AppError> {
    req.require(read_permission(toggle))?;
    let (path, name) = toggle_page(toggle);
    Ok(View::new(
        template(toggle),
        json!({
            "name": name,
            "enabled": toggle.current(&req.account),
            "formAction": req.path(path),
            "disableToggle3ds": req.account.disable_toggle3ds,
            "supports3ds": req.account.supports3ds,
        }),
    )
    .with_flash(session.take_flash()))
}

async fn apply_toggle(
    state: &AppState,
    ctx: &RequestContext,
    req: &AccountRequest,
    session: &Session,
    toggle: AccountToggle,
    enabled: bool,
) -> Result<Response, AppError> {
    req.require(update_permission(toggle))?;
    let (path, _) = toggle_page(toggle);
    let redirect = Redirect::to(&req.path(path)).into_response();

    if toggle == AccountToggle::ThreeDs {
        if req.account.disable_toggle3ds || !req.account.supports3ds {
            tracing::info!(
                gateway_account_id = req.account.gateway_account_id,
                payment_provider = %req.account.payment_provider,
                "refusing 3DS toggle for provider"
            );
            session.flash(FLASH_ERROR, THREE_DS_LOCKED_MESSAGE);
            return Ok(redirect);
        }
        if !enabled {
            let accepted = state
                .connector
                .get_accepted_card_types(ctx, req.account.gateway_account_id)
                .await?;
            if accepted.iter().any(|c| c.requires3ds) {
                session.flash(FLASH_ERROR, THREE_DS_CARDS_MESSAGE);
                return Ok(redirect);
            }
        }
    }

    state
        .connector
        .toggle(ctx, req.account.gateway_account_id, toggle, enabled)
        .await?;

    tracing::info!(
        gateway_account_id = req.account.gateway_account_id,
        setting = toggle.patch_path(),
        enabled,
        "updated gateway account setting"
    );
    session.flash(FLASH_GENERIC, flash_message(toggle, enabled));
    Ok(redirect)
}

#[derive(Debug, Deserialize)]
pub struct ApplePayForm {
    #[serde(rename = "apple-pay")]
    pub apple_pay: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GooglePayForm {
    #[serde(rename = "google-pay")]
    pub google_pay: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreeDsForm {
    #[serde(rename = "three-dee-secure")]
    pub three_ds: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HideCardNumberForm {
    #[serde(rename = "hide-card-number")]
    pub hide_card_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HideSecurityCodeForm {
    #[serde(rename = "hide-card-security-code")]
    pub hide_security_code: Option<String>,
}

pub async fn apple_pay(req: AccountRequest, session: Session) -> Result<View, AppError> {
    render_toggle(&req, &session, AccountToggle::ApplePay)
}

pub async fn update_apple_pay(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<ApplePayForm>,
) -> Result<Response, AppError> {
    let enabled = is_on(form.apple_pay.as_deref());
    apply_toggle(&state, &ctx, &req, &session, AccountToggle::ApplePay, enabled).await
}

pub async fn google_pay(req: AccountRequest, session: Session) -> Result<View, AppError> {
    render_toggle(&req, &session, AccountToggle::GooglePay)
}

pub async fn update_google_pay(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<GooglePayForm>,
) -> Result<Response, AppError> {
    let enabled = is_on(form.google_pay.as_deref());
    apply_toggle(&state, &ctx, &req, &session, AccountToggle::GooglePay, enabled).await
}

pub async fn three_ds(req: AccountRequest, session: Session) -> Result<View, AppError> {
    render_toggle(&req, &session, AccountToggle::ThreeDs)
}

pub async fn update_three_ds(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<ThreeDsForm>,
) -> Result<Response, AppError> {
    let enabled = is_on(form.three_ds.as_deref());
    apply_toggle(&state, &ctx, &req, &session, AccountToggle::ThreeDs, enabled).await
}

pub async fn moto_hide_card_number(req: AccountRequest, session: Session) -> Result<View, AppError> {
    render_toggle(&req, &session, AccountToggle::MotoMaskCardNumber)
}

pub async fn update_moto_hide_card_number(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<HideCardNumberForm>,
) -> Result<Response, AppError> {
    let enabled = is_on(form.hide_card_number.as_deref());
    apply_toggle(&state, &ctx, &req, &session, AccountToggle::MotoMaskCardNumber, enabled).await
}

pub async fn moto_hide_security_code(req: AccountRequest, session: Session) -> Result<View, AppError> {
    render_toggle(&req, &session, AccountToggle::MotoMaskSecurityCode)
}

pub async fn update_moto_hide_security_code(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<HideSecurityCodeForm>,
) -> Result<Response, AppError> {
    let enabled = is_on(form.hide_security_code.as_deref());
    apply_toggle(&state, &ctx, &req, &session, AccountToggle::MotoMaskSecurityCode, enabled).await
}
