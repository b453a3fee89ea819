//! Stripe onboarding steps against stubbed connector and Stripe APIs.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json as body_json_eq, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

const PERMISSIONS: &[&str] = &[
    "stripe-bank-details:update",
    "stripe-vat-number-company-number:update",
    "stripe-responsible-person:update",
];

async fn mount_stripe_account(server: &MockServer, setup: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(PERMISSIONS)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("stripe")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/accounts/{}/stripe-setup", ACCOUNT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/accounts/{}/stripe-account", ACCOUNT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stripe_account_id": "acct_123" })))
        .mount(server)
        .await;
}

fn bank_details_uri() -> String {
    format!("/account/{}/stripe-setup/bank-details", ACCOUNT_EXTERNAL_ID)
}

#[tokio::test]
async fn test_bank_details_are_sent_to_stripe_and_recorded() {
    let server = MockServer::start().await;
    mount_stripe_account(&server, json!({ "bank_account": false })).await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct_123"))
        .and(header("authorization", format!("Bearer {}", STRIPE_KEY).as_str()))
        .and(body_string_contains("external_account%5Brouting_number%5D=309430"))
        .and(body_string_contains("external_account%5Baccount_number%5D=00012345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "acct_123" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/api/accounts/{}/stripe-setup", ACCOUNT_ID)))
        .and(body_json_eq(json!([
            { "op": "replace", "path": "bank_account", "value": true }
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(post_form(
            &bank_details_uri(),
            "account-number=00012345&sort-code=30-94-30",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        format!("/account/{}/stripe-setup", ACCOUNT_EXTERNAL_ID)
    );
}

#[tokio::test]
async fn test_invalid_sort_code_goes_back_to_the_form() {
    let server = MockServer::start().await;
    mount_stripe_account(&server, json!({ "bank_account": false })).await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct_123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(post_form(&bank_details_uri(), "account-number=00012345&sort-code=12"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), bank_details_uri());
    assert!(session_cookie(&resp).is_some());
}

#[tokio::test]
async fn test_stripe_rejection_is_flashed_and_not_recorded() {
    let server = MockServer::start().await;
    mount_stripe_account(&server, json!({ "bank_account": false })).await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct_123"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Invalid sort code" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/api/accounts/{}/stripe-setup", ACCOUNT_ID)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(post_form(
            &bank_details_uri(),
            "account-number=00012345&sort-code=309430",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), bank_details_uri());
}

#[tokio::test]
async fn test_completed_step_redirects_to_task_list() {
    let server = MockServer::start().await;
    mount_stripe_account(&server, json!({ "bank_account": true })).await;

    let resp = app(&server).oneshot(get(&bank_details_uri())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        format!("/account/{}/stripe-setup", ACCOUNT_EXTERNAL_ID)
    );
}

#[tokio::test]
async fn test_task_list_shows_outstanding_steps() {
    let server = MockServer::start().await;
    mount_stripe_account(&server, json!({ "bank_account": true, "vat_number": false })).await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/stripe-setup", ACCOUNT_EXTERNAL_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["template"], "stripe-setup/index");
    let tasks = body["context"]["tasks"].as_array().unwrap();
    assert!(tasks.iter().any(|t| t["complete"] == true));
    assert!(tasks.iter().any(|t| t["complete"] == false));
}

#[tokio::test]
async fn test_non_stripe_account_has_no_setup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(PERMISSIONS)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("worldpay")))
        .mount(&server)
        .await;

    let resp = app(&server).oneshot(get(&bank_details_uri())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_list_needs_a_stripe_permission() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(&["transactions:read"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("stripe")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/accounts/{}/stripe-setup", ACCOUNT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bank_account": false })))
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/stripe-setup", ACCOUNT_EXTERNAL_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
