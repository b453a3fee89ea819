//! Webhook subscriptions for a gateway account.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::json;

use super::path_param;
use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::models::json_patch::PatchOp;
use crate::models::webhook::{CreateWebhookRequest, WEBHOOK_EVENT_TYPES};
use crate::services::pagination::{Pagination, DEFAULT_DISPLAY_SIZE};
use crate::AppState;

const MAX_DESCRIPTION_LENGTH: usize = 50;

/// Validated create/update form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookForm {
    pub callback_url: String,
    pub description: String,
    pub subscriptions: Vec<String>,
}

impl WebhookForm {
    /// Parse a form body; `subscriptions` is a repeated checkbox.
    pub fn parse(body: &[u8]) -> Result<Self, &'static str> {
        let mut callback_url = String::new();
        let mut description = String::new();
        let mut subscriptions = Vec::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "callback_url" => callback_url = value.trim().to_string(),
                "description" => description = value.trim().to_string(),
                "subscriptions" => subscriptions.push(value.trim().to_string()),
                _ => {}
            }
        }

        match url::Url::parse(&callback_url) {
            Ok(u) if u.scheme() == "https" && u.host_str().is_some() => {}
            _ => return Err("Enter a valid callback URL starting with https://"),
        }
        if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err("Enter a description of 50 characters or fewer");
        }
        if subscriptions.is_empty() {
            return Err("Select at least one payment event");
        }
        if subscriptions
            .iter()
            .any(|s| !WEBHOOK_EVENT_TYPES.contains(&s.as_str()))
        {
            return Err("Select a valid payment event");
        }

        Ok(Self {
            callback_url,
            description,
            subscriptions,
        })
    }

    fn patch(&self) -> Vec<PatchOp> {
        vec![
            PatchOp::replace("callback_url", self.callback_url.clone()),
            PatchOp::replace("description", self.description.clone()),
            PatchOp::replace("subscriptions", self.subscriptions.clone()),
        ]
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<View, AppError> {
    req.require(permission::WEBHOOKS_READ)?;
    let webhooks = state
        .webhooks
        .list_webhooks(
            &ctx,
            &req.service.external_id,
            req.account.gateway_account_id,
            req.account.is_live(),
        )
        .await?;

    Ok(View::new(
        "webhooks/index",
        json!({
            "webhooks": webhooks,
            "createLink": req.path("webhooks/create"),
            "eventTypes": WEBHOOK_EVENT_TYPES,
        }),
    )
    .with_flash(session.take_flash()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageQuery {
    pub page: Option<u64>,
    pub status: Option<String>,
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<MessageQuery>,
) -> Result<View, AppError> {
    req.require(permission::WEBHOOKS_READ)?;
    let webhook_id = path_param(&params, "webhookId")?;
    let account_id = req.account.gateway_account_id;

    let webhook = state
        .webhooks
        .get_webhook(&ctx, webhook_id, &req.service.external_id, account_id)
        .await?;
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| matches!(*s, "successful" | "failed"));
    let messages = state
        .webhooks
        .list_messages(&ctx, webhook_id, page, status)
        .await?;

    Ok(View::new(
        "webhooks/detail",
        json!({
            "webhook": webhook,
            "messages": messages.results,
            "status": status,
            "pagination": Pagination::new(messages.total, messages.page, DEFAULT_DISPLAY_SIZE),
            "updateLink": req.path(&format!("webhooks/{}/update", webhook_id)),
            "signingSecretLink": req.path(&format!("webhooks/{}/signing-secret", webhook_id)),
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn signing_secret(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<View, AppError> {
    req.require(permission::WEBHOOKS_READ)?;
    let webhook_id = path_param(&params, "webhookId")?;
    let account_id = req.account.gateway_account_id;
    let webhook = state
        .webhooks
        .get_webhook(&ctx, webhook_id, &req.service.external_id, account_id)
        .await?;
    let secret = state
        .webhooks
        .get_signing_secret(&ctx, webhook_id, &req.service.external_id, account_id)
        .await?;

    Ok(View::new(
        "webhooks/signing-secret",
        json!({ "webhook": webhook, "signingSecret": secret.signing_key }),
    ))
}

pub async fn create_page(req: AccountRequest, session: Session) -> Result<View, AppError> {
    req.require(permission::WEBHOOKS_UPDATE)?;
    Ok(View::new(
        "webhooks/edit",
        json!({
            "formAction": req.path("webhooks/create"),
            "eventTypes": WEBHOOK_EVENT_TYPES,
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    body: Bytes,
) -> Result<Response, AppError> {
    req.require(permission::WEBHOOKS_UPDATE)?;
    let form = match WebhookForm::parse(&body) {
        Ok(f) => f,
        Err(message) => {
            session.flash(FLASH_ERROR, message);
            return Ok(Redirect::to(&req.path("webhooks/create")).into_response());
        }
    };

    let request = CreateWebhookRequest {
        service_id: req.service.external_id.clone(),
        gateway_account_id: req.account.gateway_account_id.to_string(),
        live: req.account.is_live(),
        callback_url: form.callback_url,
        description: form.description,
        subscriptions: form.subscriptions,
    };
    let webhook = state.webhooks.create_webhook(&ctx, &request).await?;
    tracing::info!(webhook_external_id = %webhook.external_id, "created webhook");

    session.flash(FLASH_GENERIC, "Webhook created");
    Ok(Redirect::to(&req.path("webhooks")).into_response())
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<View, AppError> {
    req.require(permission::WEBHOOKS_UPDATE)?;
    let webhook_id = path_param(&params, "webhookId")?;
    let webhook = state
        .webhooks
        .get_webhook(&ctx, webhook_id, &req.service.external_id, req.account.gateway_account_id)
        .await?;
    Ok(View::new(
        "webhooks/edit",
        json!({
            "webhook": webhook,
            "formAction": req.path(&format!("webhooks/{}/update", webhook_id)),
            "eventTypes": WEBHOOK_EVENT_TYPES,
        }),
    )
    .with_flash(session.take_flash()))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Path(params): Path<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, AppError> {
    req.require(permission::WEBHOOKS_UPDATE)?;
    let webhook_id = path_param(&params, "webhookId")?;
    let form = match WebhookForm::parse(&body) {
        Ok(f) => f,
        Err(message) => {
            session.flash(FLASH_ERROR, message);
            return Ok(Redirect::to(&req.path(&format!("webhooks/{}/update", webhook_id))).into_response());
        }
    };

    state
        .webhooks
        .update_webhook(
            &ctx,
            webhook_id,
            &req.service.external_id,
            req.account.gateway_account_id,
            &form.patch(),
        )
        .await?;

    session.flash(FLASH_GENERIC, "Webhook updated");
    Ok(Redirect::to(&req.path(&format!("webhooks/{}", webhook_id))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_form() {
        let form = WebhookForm::parse(
            b"callback_url=https%3A%2F%2Fexample.org%2Fhook&description=Orders&subscriptions=card_payment_succeeded&subscriptions=card_payment_refunded",
        )
        .unwrap();
        assert_eq!(form.callback_url, "https://example.org/hook");
        assert_eq!(form.subscriptions.len(), 2);
        assert_eq!(form.patch()[2].value, json!(["card_payment_succeeded", "card_payment_refunded"]));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(WebhookForm::parse(b"callback_url=http%3A%2F%2Fexample.org&description=x&subscriptions=card_payment_succeeded").is_err());
        assert!(WebhookForm::parse(b"callback_url=https%3A%2F%2Fexample.org&description=x").is_err());
        assert!(WebhookForm::parse(b"callback_url=https%3A%2F%2Fexample.org&description=&subscriptions=card_payment_succeeded").is_err());
        assert!(WebhookForm::parse(b"callback_url=https%3A%2F%2Fexample.org&description=x&subscriptions=bogus").is_err());
    }
}
