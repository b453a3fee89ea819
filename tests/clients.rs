//! Backend clients against wiremock: paths, correlation header and error
//! mapping.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use selfservice::clients::connector::{ConnectorApi, ConnectorClient};
use selfservice::clients::products::ProductsClient;
use selfservice::middleware::correlation::RequestContext;

fn timeout() -> Duration {
    Duration::from_secs(5)
}

#[tokio::test]
async fn test_get_account_sends_correlation_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/frontend/accounts/{}", ACCOUNT_ID)))
        .and(header("x-request-id", "corr-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("sandbox")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ConnectorClient::new(&server.uri(), timeout()).unwrap();
    let account = client
        .get_account(&RequestContext::new("corr-abc"), ACCOUNT_ID)
        .await
        .unwrap();
    assert_eq!(account.external_id, ACCOUNT_EXTERNAL_ID);
    assert_eq!(account.payment_provider, "sandbox");
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/card-types"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["Field [card_types] is required"]
        })))
        .mount(&server)
        .await;

    let client = ConnectorClient::new(&server.uri(), timeout()).unwrap();
    let err = client
        .get_all_card_types(&RequestContext::new(CORRELATION_ID))
        .await
        .unwrap_err();
    assert_eq!(err.error_code, Some(400));
    assert!(err.is_client_error());
    assert!(!err.is_not_found());
    assert_eq!(err.message, "Field [card_types] is required");
}

#[tokio::test]
async fn test_unreachable_backend_has_no_error_code() {
    let client = ConnectorClient::new("http://127.0.0.1:1", timeout()).unwrap();
    let err = client
        .get_account(&RequestContext::new(CORRELATION_ID), ACCOUNT_ID)
        .await
        .unwrap_err();
    assert_eq!(err.error_code, None);
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_payment_links_are_adhoc_products() {
    let server = MockServer::start().await;
    let product = json!({
        "external_id": "prod-1",
        "gateway_account_id": ACCOUNT_ID,
        "name": "Parking permit",
        "price": 1500,
        "type": "ADHOC",
        "_links": [
            { "rel": "pay", "href": "http://products.test/pay/prod-1" },
            { "rel": "friendly", "href": "http://products.test/redirect/council/parking-permit" }
        ]
    });
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/gateway-account/{}/products", ACCOUNT_ID)))
        .and(query_param("type", "ADHOC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product.clone()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/api/gateway-account/{}/products/prod-1", ACCOUNT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(product))
        .expect(1)
        .mount(&server)
        .await;

    let client = ProductsClient::new(&server.uri(), timeout()).unwrap();
    let ctx = RequestContext::new(CORRELATION_ID);
    let links = client.list_payment_links(&ctx, ACCOUNT_ID).await.unwrap();
    assert_eq!(links.len(), 1);

    let link = client.get_product(&ctx, ACCOUNT_ID, "prod-1").await.unwrap();
    assert_eq!(link.price, Some(1500));
    assert_eq!(
        link.friendly_url(),
        Some("http://products.test/redirect/council/parking-permit")
    );
}
