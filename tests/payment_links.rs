//! Payment link creation and management.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

const TOKEN: &str = "api_test_token_abc";

async fn mount_account(server: &MockServer, permissions: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(permissions)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("worldpay")))
        .mount(server)
        .await;
}

fn product_json() -> serde_json::Value {
    json!({
        "external_id": "prod-1",
        "gateway_account_id": ACCOUNT_ID,
        "name": "Parking permit",
        "price": 1250,
        "type": "ADHOC",
        "service_name_path": "pay-for-a-parking-permit",
        "product_name_path": "parking-permit"
    })
}

#[tokio::test]
async fn test_create_mints_token_then_product() {
    let server = MockServer::start().await;
    mount_account(&server, &["tokens:create"]).await;
    Mock::given(method("POST"))
        .and(path("/v1/frontend/auth"))
        .and(body_partial_json(json!({
            "account_id": ACCOUNT_ID,
            "token_type": "CARD",
            "type": "PRODUCTS",
            "created_by": "someone@example.org"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": TOKEN })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/api/products"))
        .and(body_partial_json(json!({
            "gateway_account_id": ACCOUNT_ID,
            "pay_api_token": TOKEN,
            "name": "Parking permit",
            "price": 1250,
            "type": "ADHOC",
            "service_name_path": "pay-for-a-parking-permit",
            "product_name_path": "parking-permit",
            "reference_enabled": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(product_json()))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(post_form(
            &format!("/account/{}/create-payment-link", ACCOUNT_EXTERNAL_ID),
            "payment-link-title=Parking+permit&payment-amount=12.50",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        format!("/account/{}/create-payment-link/manage", ACCOUNT_EXTERNAL_ID)
    );

    let posted: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(posted, vec!["/v1/frontend/auth", "/v1/api/products"]);
}

#[tokio::test]
async fn test_create_with_bad_amount_calls_nothing() {
    let server = MockServer::start().await;
    mount_account(&server, &["tokens:create"]).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = format!("/account/{}/create-payment-link", ACCOUNT_EXTERNAL_ID);
    let resp = app(&server)
        .oneshot(post_form(&page, "payment-link-title=Parking+permit&payment-amount=twelve"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), page);
    assert_eq!(
        session_data(&resp).flash["genericError"],
        vec!["Enter an amount in pounds and pence, like 12.50".to_string()]
    );
}

#[tokio::test]
async fn test_manage_lists_links_with_public_urls() {
    let server = MockServer::start().await;
    mount_account(&server, &["tokens:read"]).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/gateway-account/{}/products", ACCOUNT_ID)))
        .and(query_param("type", "ADHOC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json()])))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/create-payment-link/manage", ACCOUNT_EXTERNAL_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["context"]["productsLength"], 1);
    assert_eq!(
        body["context"]["products"][0]["url"],
        "http://products.test/redirect/pay-for-a-parking-permit/parking-permit"
    );
}
