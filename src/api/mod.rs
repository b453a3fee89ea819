//! HTTP routes.
//!
//! Account-scoped pages are mounted under three prefixes:
//! `/account/:gatewayAccountExternalId`,
//! `/service/:serviceExternalId/account/:gatewayAccountExternalId` and
//! `/service/:serviceExternalId/:environment`. Team pages are service-scoped.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::middleware::account::account_middleware;
use crate::middleware::correlation::correlation_middleware;
use crate::middleware::session::session_middleware;
use crate::middleware::user::user_middleware;
use crate::AppState;

pub mod agreements;
pub mod card_types;
pub mod payment_links;
pub mod settings;
pub mod stripe_details;
pub mod team;
pub mod test_payment;
pub mod transactions;
pub mod view;
pub mod webhooks;

/// A named path parameter, or 404 when the route did not capture it.
pub(crate) fn path_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("missing path parameter {}", name)))
}

/// Pages that act on one gateway account. Paths are relative to the prefix.
fn account_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(settings::index))
        .route(
            "/digital-wallet/apple-pay",
            get(settings::apple_pay).post(settings::update_apple_pay),
        )
        .route(
            "/digital-wallet/google-pay",
            get(settings::google_pay).post(settings::update_google_pay),
        )
        .route(
            "/toggle-3ds",
            get(settings::three_ds).post(settings::update_three_ds),
        )
        .route(
            "/moto-hide-card-number",
            get(settings::moto_hide_card_number).post(settings::update_moto_hide_card_number),
        )
        .route(
            "/moto-hide-security-code",
            get(settings::moto_hide_security_code).post(settings::update_moto_hide_security_code),
        )
        .route(
            "/card-types",
            get(card_types::index).post(card_types::update),
        )
        // Transactions
        .route("/transactions", get(transactions::index))
        .route("/transactions/:chargeId", get(transactions::detail))
        .route("/transactions/:chargeId/refund", post(transactions::refund))
        // Agreements
        .route("/agreements", get(agreements::index))
        .route("/agreements/:agreementId", get(agreements::detail))
        // Payment links
        .route(
            "/create-payment-link",
            get(payment_links::new_link).post(payment_links::create),
        )
        .route("/create-payment-link/manage", get(payment_links::index))
        .route(
            "/create-payment-link/manage/:productExternalId/delete",
            post(payment_links::delete),
        )
        // Webhooks
        .route("/webhooks", get(webhooks::index))
        .route(
            "/webhooks/create",
            get(webhooks::create_page).post(webhooks::create),
        )
        .route("/webhooks/:webhookId", get(webhooks::detail))
        .route(
            "/webhooks/:webhookId/update",
            get(webhooks::update_page).post(webhooks::update),
        )
        .route(
            "/webhooks/:webhookId/signing-secret",
            get(webhooks::signing_secret),
        )
        // PSP test payment
        .route(
            "/test-payment",
            get(test_payment::index).post(test_payment::start),
        )
        .route("/test-payment/callback", get(test_payment::callback))
        // Stripe onboarding
        .route("/stripe-setup", get(stripe_details::task_list_page))
        .route(
            "/stripe-setup/bank-details",
            get(stripe_details::bank_details_page).post(stripe_details::bank_details),
        )
        .route(
            "/stripe-setup/vat-number",
            get(stripe_details::vat_number_page).post(stripe_details::vat_number),
        )
        .route(
            "/stripe-setup/company-number",
            get(stripe_details::company_number_page).post(stripe_details::company_number),
        )
        .route(
            "/stripe-setup/responsible-person",
            get(stripe_details::responsible_person_page).post(stripe_details::responsible_person),
        )
        .route_layer(middleware::from_fn_with_state(state, account_middleware))
}

/// Pages that act on a service as a whole.
fn service_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/team-members", get(team::index))
        .route(
            "/team-members/invite",
            get(team::invite_page).post(team::invite),
        )
        .route(
            "/team-members/:userExternalId/permissions",
            post(team::update_role),
        )
        .route("/team-members/:userExternalId/delete", post(team::remove))
        .route_layer(middleware::from_fn_with_state(state, account_middleware))
}

/// The full application: routes plus the request pipeline
/// (trace → correlation → session → user → account resolution).
pub fn app_router(state: Arc<AppState>) -> Router {
    let accounts = account_routes(state.clone());

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/account/:gatewayAccountExternalId", accounts.clone())
        .nest(
            "/service/:serviceExternalId/account/:gatewayAccountExternalId",
            accounts.clone(),
        )
        .nest("/service/:serviceExternalId/:environment", accounts)
        .nest("/service/:serviceExternalId", service_routes(state.clone()))
        .fallback(fallback_404)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), user_middleware))
        .layer(middleware::from_fn_with_state(state, session_middleware))
        .layer(middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn fallback_404() -> AppError {
    AppError::NotFound("no route".into())
}
