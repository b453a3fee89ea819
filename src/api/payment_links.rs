//! Payment links: ADHOC products backed by an API token minted for them.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use super::path_param;
use super::transactions::pounds_to_pence;
use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::models::product::{CreateProductRequest, ProductType};
use crate::AppState;

const MAX_TITLE_LENGTH: usize = 230;

/// URL-safe slug used in friendly payment link URLs.
pub fn slugify(value: &str) -> String {
    let mut slug = String::new();
    for c in value.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<View, AppError> {
    req.require(permission::TOKENS_READ)?;
    let links = state
        .products
        .list_payment_links(&ctx, req.account.gateway_account_id)
        .await?;
    let links: Vec<_> = links
        .iter()
        .map(|p| {
            json!({
                "externalId": p.external_id,
                "name": p.name,
                "description": p.description,
                "price": p.price,
                "url": p.public_url(&state.config.products_friendly_base_uri),
                "language": p.language,
                "deleteAction": req.path(&format!("create-payment-link/manage/{}/delete", p.external_id)),
            })
        })
        .collect();

    Ok(View::new(
        "payment-links/manage",
        json!({
            "productsLength": links.len(),
            "products": links,
            "createAction": req.path("create-payment-link"),
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn new_link(req: AccountRequest, session: Session) -> Result<View, AppError> {
    req.require(permission::TOKENS_CREATE)?;
    Ok(View::new(
        "payment-links/create",
        json!({
            "formAction": req.path("create-payment-link"),
            "serviceName": req.service.display_name(false),
            "isLive": req.account.is_live(),
        }),
    )
    .with_flash(session.take_flash()))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentLinkForm {
    #[serde(rename = "payment-link-title", default)]
    pub title: String,
    #[serde(rename = "payment-link-description", default)]
    pub description: String,
    #[serde(rename = "payment-amount", default)]
    pub amount: String,
    #[serde(rename = "reference-label", default)]
    pub reference_label: String,
    #[serde(rename = "reference-hint", default)]
    pub reference_hint: String,
    #[serde(rename = "language", default)]
    pub language: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<CreatePaymentLinkForm>,
) -> Result<Response, AppError> {
    req.require(permission::TOKENS_CREATE)?;
    let manage = Redirect::to(&req.path("create-payment-link/manage")).into_response();
    let back = Redirect::to(&req.path("create-payment-link")).into_response();

    let title = form.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        session.flash(FLASH_ERROR, "Enter a title of 230 characters or fewer");
        return Ok(back);
    }
    let price = match form.amount.trim() {
        "" => None,
        amount => match pounds_to_pence(amount) {
            Some(p) if p > 0 => Some(p),
            _ => {
                session.flash(FLASH_ERROR, "Enter an amount in pounds and pence, like 12.50");
                return Ok(back);
            }
        },
    };
    let reference_label = Some(form.reference_label.trim().to_string()).filter(|l| !l.is_empty());
    let language = if form.language == "cy" { "cy" } else { "en" };

    let account_id = req.account.gateway_account_id;
    let token = state
        .publicauth
        .create_product_token(
            &ctx,
            account_id,
            &format!("Token for \"{}\" payment link", title),
            &req.user.email,
        )
        .await?;

    let welsh = language == "cy";
    let request = CreateProductRequest {
        gateway_account_id: account_id,
        pay_api_token: token.token,
        name: title.to_string(),
        description: Some(form.description.trim().to_string()).filter(|d| !d.is_empty()),
        price,
        product_type: ProductType::Adhoc,
        service_name_path: slugify(req.service.display_name(welsh)),
        product_name_path: slugify(title),
        reference_enabled: reference_label.is_some(),
        reference_hint: reference_label
            .as_ref()
            .map(|_| form.reference_hint.trim().to_string())
            .filter(|h| !h.is_empty()),
        reference_label,
        language: language.to_string(),
    };
    let product = state.products.create_product(&ctx, &request).await?;
    tracing::info!(
        gateway_account_id = account_id,
        product_external_id = %product.external_id,
        "created payment link"
    );

    session.flash(FLASH_GENERIC, "Your payment link is now live");
    Ok(manage)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, AppError> {
    req.require(permission::TOKENS_DELETE)?;
    let product_id = path_param(&params, "productExternalId")?;
    let manage = Redirect::to(&req.path("create-payment-link/manage")).into_response();

    match state
        .products
        .delete_product(&ctx, req.account.gateway_account_id, product_id)
        .await
    {
        Ok(()) => session.flash(FLASH_GENERIC, "The payment link was successfully deleted"),
        Err(e) if e.is_not_found() => {
            tracing::info!(product_external_id = %product_id, "payment link already gone");
            session.flash(FLASH_ERROR, "The payment link could not be found");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(manage)
}
