//! Account and service resolution against a stubbed connector.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use selfservice::clients::connector::ConnectorClient;
use selfservice::errors::AppError;
use selfservice::middleware::account::{resolve_service_and_account, AccountRouteParams};
use selfservice::middleware::correlation::{
    RequestContext, GATEWAY_ACCOUNT_ID, GATEWAY_ACCOUNT_TYPE, SERVICE_EXTERNAL_ID,
};
use selfservice::models::user::User;

fn user() -> User {
    serde_json::from_value(user_json(&["transactions:read"])).unwrap()
}

fn by_account(external_id: &str) -> AccountRouteParams {
    AccountRouteParams {
        gateway_account_external_id: Some(external_id.into()),
        ..Default::default()
    }
}

fn connector(server: &MockServer) -> ConnectorClient {
    ConnectorClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_account_and_service_resolved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .and(header("x-request-id", CORRELATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("worldpay")))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(
        &mut ctx,
        &by_account(ACCOUNT_EXTERNAL_ID),
        Some(&user),
        &connector(&server),
    )
    .await
    .unwrap();

    let account = resolved.account.expect("account should resolve");
    assert!(account.supports3ds);
    assert!(!account.disable_toggle3ds);
    assert!(account.connector_gateway_account_stripe_progress.is_none());
    assert_eq!(resolved.service.unwrap().external_id, SERVICE_ID);
    assert!(!resolved.is_live);
    assert_eq!(resolved.base_path, format!("/account/{}", ACCOUNT_EXTERNAL_ID));
    assert_eq!(ctx.field(GATEWAY_ACCOUNT_ID), Some("42"));
    assert_eq!(ctx.field(GATEWAY_ACCOUNT_TYPE), Some("test"));
    assert_eq!(ctx.field(SERVICE_EXTERNAL_ID), Some(SERVICE_ID));
}

#[tokio::test]
async fn test_not_found_leaves_account_unset_without_log_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/frontend/accounts/external-id/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(&mut ctx, &by_account("missing"), Some(&user), &connector(&server))
        .await
        .unwrap();

    assert!(resolved.account.is_none());
    assert!(resolved.service.is_none());
    assert!(ctx.fields().is_empty());
}

#[tokio::test]
async fn test_server_error_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/frontend/accounts/external-id/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(&mut ctx, &by_account("broken"), Some(&user), &connector(&server))
        .await
        .unwrap();

    assert!(resolved.account.is_none());
    assert!(ctx.fields().is_empty());
}

#[tokio::test]
async fn test_no_identifiers_is_an_error() {
    let server = MockServer::start().await;
    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let result = resolve_service_and_account(
        &mut ctx,
        &AccountRouteParams::default(),
        Some(&user),
        &connector(&server),
    )
    .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stripe_account_gets_setup_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("stripe")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/accounts/42/stripe-setup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bank_account": true,
            "responsible_person": false,
            "vat_number": true,
            "company_number": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(
        &mut ctx,
        &by_account(ACCOUNT_EXTERNAL_ID),
        Some(&user),
        &connector(&server),
    )
    .await
    .unwrap();

    let account = resolved.account.unwrap();
    assert!(account.disable_toggle3ds);
    let progress = account.connector_gateway_account_stripe_progress.unwrap();
    assert!(progress.bank_account);
    assert!(!progress.responsible_person);
}

#[tokio::test]
async fn test_stripe_progress_failure_keeps_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("stripe")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/accounts/42/stripe-setup"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut ctx = RequestContext::new(CORRELATION_ID);
    let resolved = resolve_service_and_account(
        &mut ctx,
        &by_account(ACCOUNT_EXTERNAL_ID),
        None,
        &connector(&server),
    )
    .await
    .unwrap();

    let account = resolved.account.unwrap();
    assert!(account.connector_gateway_account_stripe_progress.is_none());
    assert!(resolved.service.is_none());
    assert_eq!(ctx.field(GATEWAY_ACCOUNT_ID), Some("42"));
}

#[tokio::test]
async fn test_service_and_environment_fetches_by_type() {
    let server = MockServer::start().await;
    let mut live = account_json("worldpay");
    live["type"] = json!("live");
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/service/{}/account/live", SERVICE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(live))
        .expect(1)
        .mount(&server)
        .await;

    let params = AccountRouteParams {
        service_external_id: Some(SERVICE_ID.into()),
        gateway_account_external_id: None,
        environment: Some("live".into()),
    };
    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(&mut ctx, &params, Some(&user), &connector(&server))
        .await
        .unwrap();

    assert!(resolved.is_live);
    assert!(resolved.account.unwrap().is_live());
    assert_eq!(resolved.service.unwrap().external_id, SERVICE_ID);
    assert_eq!(resolved.base_path, format!("/service/{}/live", SERVICE_ID));
    assert_eq!(ctx.field(GATEWAY_ACCOUNT_TYPE), Some("live"));
}

#[tokio::test]
async fn test_explicit_service_id_must_match_a_role() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("worldpay")))
        .mount(&server)
        .await;

    let params = AccountRouteParams {
        service_external_id: Some("someone-elses-service".into()),
        gateway_account_external_id: Some(ACCOUNT_EXTERNAL_ID.into()),
        environment: None,
    };
    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(&mut ctx, &params, Some(&user), &connector(&server))
        .await
        .unwrap();

    assert!(resolved.account.is_some());
    assert!(resolved.service.is_none());
}

#[tokio::test]
async fn test_explicit_service_id_must_own_the_account() {
    let server = MockServer::start().await;
    let mut other = account_json("worldpay");
    other["gateway_account_id"] = json!(99);
    Mock::given(method("GET"))
        .and(path("/v1/frontend/accounts/external-id/other-services-account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(other))
        .mount(&server)
        .await;

    let params = AccountRouteParams {
        service_external_id: Some(SERVICE_ID.into()),
        gateway_account_external_id: Some("other-services-account".into()),
        environment: None,
    };
    let mut ctx = RequestContext::new(CORRELATION_ID);
    let user = user();
    let resolved = resolve_service_and_account(&mut ctx, &params, Some(&user), &connector(&server))
        .await
        .unwrap();

    assert_eq!(resolved.account.unwrap().gateway_account_id, 99);
    assert!(resolved.service.is_none());
    assert_eq!(ctx.field(SERVICE_EXTERNAL_ID), None);
}
