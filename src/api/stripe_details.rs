//! Stripe onboarding pages: the task list plus one form per setup step.
//!
//! Every submission validates locally, sends the details to Stripe against
//! the connected account and then marks the step complete in connector.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use super::view::View;
use crate::clients::ClientError;
use crate::errors::AppError;
use crate::middleware::account::AccountRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::models::stripe::{StripeAccountSetup, StripeSetupStep};
use crate::services::stripe_details::{
    normalise_account_number, normalise_company_number, normalise_sort_code,
    normalise_vat_number, task_list, ResponsiblePersonForm,
};
use crate::AppState;

const TASK_LIST_PATH: &str = "stripe-setup";

fn step_path(step: StripeSetupStep) -> &'static str {
    match step {
        StripeSetupStep::BankAccount => "stripe-setup/bank-details",
        StripeSetupStep::ResponsiblePerson => "stripe-setup/responsible-person",
        StripeSetupStep::VatNumber => "stripe-setup/vat-number",
        StripeSetupStep::CompanyNumber => "stripe-setup/company-number",
        _ => TASK_LIST_PATH,
    }
}

fn step_permission(step: StripeSetupStep) -> &'static str {
    match step {
        StripeSetupStep::BankAccount => permission::STRIPE_BANK_DETAILS_UPDATE,
        StripeSetupStep::ResponsiblePerson => permission::STRIPE_RESPONSIBLE_PERSON_UPDATE,
        _ => permission::STRIPE_VAT_COMPANY_NUMBER_UPDATE,
    }
}

fn step_done_message(step: StripeSetupStep) -> &'static str {
    match step {
        StripeSetupStep::BankAccount => "Bank details added",
        StripeSetupStep::ResponsiblePerson => "Responsible person added",
        StripeSetupStep::VatNumber => "VAT registration number added",
        StripeSetupStep::CompanyNumber => "Company registration number added",
        _ => "Details added",
    }
}

/// Current setup progress; only Stripe accounts have one.
async fn setup_for(
    state: &AppState,
    ctx: &RequestContext,
    req: &AccountRequest,
) -> Result<StripeAccountSetup, AppError> {
    if !req.account.is_stripe() && !req.account.is_switching_to_stripe() {
        return Err(AppError::NotFound("stripe setup for non-stripe account".into()));
    }
    match &req.account.connector_gateway_account_stripe_progress {
        Some(progress) => Ok(progress.clone()),
        None => Ok(state
            .connector
            .get_stripe_account_setup(ctx, req.account.gateway_account_id)
            .await?),
    }
}

pub async fn task_list_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<View, AppError> {
    req.require_any(permission::STRIPE_SETUP_PERMISSIONS)?;
    let setup = setup_for(&state, &ctx, &req).await?;
    let tasks: Vec<_> = task_list(&setup)
        .into_iter()
        .map(|t| {
            json!({
                "step": t.step,
                "complete": t.complete,
                "link": req.path(t.path),
            })
        })
        .collect();
    let complete = tasks.iter().all(|t| t["complete"] == json!(true));

    Ok(View::new(
        "stripe-setup/index",
        json!({
            "tasks": tasks,
            "setupComplete": complete,
            "outstandingSteps": setup.outstanding(),
            "stripeAccountSetup": setup,
        }),
    )
    .with_flash(session.take_flash()))
}

/// Renders a step form, or bounces back to the task list once it is done.
async fn step_page(
    state: &AppState,
    ctx: &RequestContext,
    req: &AccountRequest,
    session: &Session,
    step: StripeSetupStep,
    template: &'static str,
) -> Result<Response, AppError> {
    req.require(step_permission(step))?;
    let setup = setup_for(state, ctx, req).await?;
    if setup.is_complete(step) {
        return Ok(Redirect::to(&req.path(TASK_LIST_PATH)).into_response());
    }
    Ok(View::new(template, json!({ "formAction": req.path(step_path(step)) }))
        .with_flash(session.take_flash())
        .into_response())
}

/// Shared tail of every submission: report Stripe's verdict, then mark the
/// step complete in connector.
async fn finish_step(
    state: &AppState,
    ctx: &RequestContext,
    req: &AccountRequest,
    session: &Session,
    step: StripeSetupStep,
    stripe_result: Result<(), ClientError>,
) -> Result<Response, AppError> {
    match stripe_result {
        Ok(()) => {}
        Err(e) if e.is_client_error() => {
            tracing::info!(
                gateway_account_id = req.account.gateway_account_id,
                step = step.patch_path(),
                error = %e.message,
                "stripe rejected details"
            );
            session.flash(FLASH_ERROR, e.message);
            return Ok(Redirect::to(&req.path(step_path(step))).into_response());
        }
        Err(e) => return Err(e.into()),
    }

    state
        .connector
        .set_stripe_account_setup_flag(ctx, req.account.gateway_account_id, step)
        .await?;
    tracing::info!(
        gateway_account_id = req.account.gateway_account_id,
        step = step.patch_path(),
        "stripe setup step completed"
    );
    session.flash(FLASH_GENERIC, step_done_message(step));
    Ok(Redirect::to(&req.path(TASK_LIST_PATH)).into_response())
}

/// Checks shared by every submission. `Some` is an early response.
async fn precheck(
    state: &AppState,
    ctx: &RequestContext,
    req: &AccountRequest,
    step: StripeSetupStep,
) -> Result<Option<Response>, AppError> {
    req.require(step_permission(step))?;
    let setup = setup_for(state, ctx, req).await?;
    if setup.is_complete(step) {
        return Ok(Some(Redirect::to(&req.path(TASK_LIST_PATH)).into_response()));
    }
    Ok(None)
}

fn invalid(session: &Session, req: &AccountRequest, step: StripeSetupStep, message: &str) -> Response {
    session.flash(FLASH_ERROR, message);
    Redirect::to(&req.path(step_path(step))).into_response()
}

pub async fn bank_details_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    step_page(&state, &ctx, &req, &session, StripeSetupStep::BankAccount, "stripe-setup/bank-details").await
}

#[derive(Debug, Deserialize)]
pub struct BankDetailsForm {
    #[serde(rename = "account-number", default)]
    pub account_number: String,
    #[serde(rename = "sort-code", default)]
    pub sort_code: String,
}

pub async fn bank_details(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<BankDetailsForm>,
) -> Result<Response, AppError> {
    let step = StripeSetupStep::BankAccount;
    if let Some(early) = precheck(&state, &ctx, &req, step).await? {
        return Ok(early);
    }
    let sort_code = match normalise_sort_code(&form.sort_code) {
        Ok(v) => v,
        Err(message) => return Ok(invalid(&session, &req, step, message)),
    };
    let account_number = match normalise_account_number(&form.account_number) {
        Ok(v) => v,
        Err(message) => return Ok(invalid(&session, &req, step, message)),
    };

    let stripe_account = state
        .connector
        .get_stripe_account(&ctx, req.account.gateway_account_id)
        .await?;
    let result = state
        .stripe
        .update_bank_account(&ctx, &stripe_account.stripe_account_id, &sort_code, &account_number)
        .await;
    finish_step(&state, &ctx, &req, &session, step, result).await
}

pub async fn vat_number_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    step_page(&state, &ctx, &req, &session, StripeSetupStep::VatNumber, "stripe-setup/vat-number").await
}

#[derive(Debug, Deserialize)]
pub struct VatNumberForm {
    #[serde(rename = "vat-number", default)]
    pub vat_number: String,
}

pub async fn vat_number(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<VatNumberForm>,
) -> Result<Response, AppError> {
    let step = StripeSetupStep::VatNumber;
    if let Some(early) = precheck(&state, &ctx, &req, step).await? {
        return Ok(early);
    }
    let vat_number = match normalise_vat_number(&form.vat_number) {
        Ok(v) => v,
        Err(message) => return Ok(invalid(&session, &req, step, message)),
    };

    let stripe_account = state
        .connector
        .get_stripe_account(&ctx, req.account.gateway_account_id)
        .await?;
    let result = state
        .stripe
        .update_vat_number(&ctx, &stripe_account.stripe_account_id, &vat_number)
        .await;
    finish_step(&state, &ctx, &req, &session, step, result).await
}

pub async fn company_number_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    step_page(&state, &ctx, &req, &session, StripeSetupStep::CompanyNumber, "stripe-setup/company-number").await
}

#[derive(Debug, Deserialize)]
pub struct CompanyNumberForm {
    /// `true` when the organisation has a company registration number.
    #[serde(rename = "company-number-declaration", default)]
    pub declaration: String,
    #[serde(rename = "company-number", default)]
    pub company_number: String,
}

pub async fn company_number(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<CompanyNumberForm>,
) -> Result<Response, AppError> {
    let step = StripeSetupStep::CompanyNumber;
    if let Some(early) = precheck(&state, &ctx, &req, step).await? {
        return Ok(early);
    }

    let result = match form.declaration.trim() {
        "false" => Ok(()),
        "true" => {
            let company_number = match normalise_company_number(&form.company_number) {
                Ok(v) => v,
                Err(message) => return Ok(invalid(&session, &req, step, message)),
            };
            let stripe_account = state
                .connector
                .get_stripe_account(&ctx, req.account.gateway_account_id)
                .await?;
            state
                .stripe
                .update_company_number(&ctx, &stripe_account.stripe_account_id, &company_number)
                .await
        }
        _ => {
            return Ok(invalid(
                &session,
                &req,
                step,
                "Select yes if your organisation has a company registration number",
            ))
        }
    };
    finish_step(&state, &ctx, &req, &session, step, result).await
}

pub async fn responsible_person_page(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
) -> Result<Response, AppError> {
    step_page(
        &state,
        &ctx,
        &req,
        &session,
        StripeSetupStep::ResponsiblePerson,
        "stripe-setup/responsible-person",
    )
    .await
}

pub async fn responsible_person(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: AccountRequest,
    Form(form): Form<ResponsiblePersonForm>,
) -> Result<Response, AppError> {
    let step = StripeSetupStep::ResponsiblePerson;
    if let Some(early) = precheck(&state, &ctx, &req, step).await? {
        return Ok(early);
    }
    let person = match form.validate() {
        Ok(p) => p,
        Err(errors) => {
            for message in errors.values() {
                session.flash(FLASH_ERROR, *message);
            }
            return Ok(Redirect::to(&req.path(step_path(step))).into_response());
        }
    };

    let stripe_account = state
        .connector
        .get_stripe_account(&ctx, req.account.gateway_account_id)
        .await?;
    let result = state
        .stripe
        .upsert_responsible_person(&ctx, &stripe_account.stripe_account_id, &person)
        .await;
    finish_step(&state, &ctx, &req, &session, step, result).await
}
