//! Agreements list and detail against a stubbed ledger.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

const AGREEMENT_ID: &str = "agr-1";

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(&["agreements:read"])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/external-id/{}", ACCOUNT_EXTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("worldpay")))
        .mount(server)
        .await;
}

fn agreement_json() -> serde_json::Value {
    json!({
        "external_id": AGREEMENT_ID,
        "service_id": SERVICE_ID,
        "reference": "ref-1",
        "description": "Monthly permit",
        "status": "ACTIVE",
        "created_date": "2024-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_index_searches_ledger_with_filters() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/agreement"))
        .and(query_param("service_id", SERVICE_ID))
        .and(query_param("live", "false"))
        .and(query_param("page", "1"))
        .and(query_param("display_size", "20"))
        .and(query_param("status", "ACTIVE"))
        .and(query_param_is_missing("reference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "count": 1,
            "page": 1,
            "results": [agreement_json()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/agreements?status=active", ACCOUNT_EXTERNAL_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["template"], "agreements/index");
    assert_eq!(body["context"]["total"], 1);
    assert_eq!(body["context"]["agreements"][0]["external_id"], AGREEMENT_ID);
}

#[tokio::test]
async fn test_detail_links_to_filtered_transactions() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/agreement/{}", AGREEMENT_ID)))
        .and(query_param("service_id", SERVICE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(agreement_json()))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/agreements/{}", ACCOUNT_EXTERNAL_ID, AGREEMENT_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["template"], "agreements/detail");
    assert_eq!(
        body["context"]["transactionsLink"],
        format!("/account/{}/transactions?agreementId={}", ACCOUNT_EXTERNAL_ID, AGREEMENT_ID)
    );
}

#[tokio::test]
async fn test_unknown_agreement_is_not_found() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/agreement/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(get(&format!("/account/{}/agreements/missing", ACCOUNT_EXTERNAL_ID)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["template"], "error");
}
