//! Shared fixtures for the router-level tests: one wiremock server stands in
//! for every backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::{json, Value};
use wiremock::MockServer;

use selfservice::config::Config;
use selfservice::middleware::session::{self, SessionData, SESSION_COOKIE};
use selfservice::AppState;

pub const USER_ID: &str = "user-1";
pub const SERVICE_ID: &str = "svc-1";
pub const ACCOUNT_EXTERNAL_ID: &str = "a-valid-external-id";
pub const ACCOUNT_ID: i64 = 42;
pub const CORRELATION_ID: &str = "test-correlation-id";
pub const STRIPE_KEY: &str = "sk_test_123";
pub const SESSION_KEY: &str = "test-session-key";

pub fn config(backend: &MockServer) -> Config {
    let uri = backend.uri();
    Config {
        port: 0,
        connector_url: uri.clone(),
        ledger_url: uri.clone(),
        products_url: uri.clone(),
        public_auth_url: uri.clone(),
        webhooks_url: uri.clone(),
        adminusers_url: uri.clone(),
        stripe_api_url: uri,
        stripe_api_key: STRIPE_KEY.into(),
        session_key: SESSION_KEY.into(),
        selfservice_url: "http://selfservice.test".into(),
        products_friendly_base_uri: "http://products.test/redirect".into(),
        http_timeout_ms: 5_000,
        auth_user_header: "x-authenticated-user".into(),
    }
}

pub fn state(backend: &MockServer) -> Arc<AppState> {
    Arc::new(AppState::from_config(config(backend)).unwrap())
}

pub fn app(backend: &MockServer) -> Router {
    selfservice::api::app_router(state(backend))
}

pub fn service_json() -> Value {
    json!({
        "external_id": SERVICE_ID,
        "name": "System Generated",
        "service_name": { "en": "Pay for a parking permit" },
        "gateway_account_ids": [ACCOUNT_ID.to_string()]
    })
}

pub fn user_json(permissions: &[&str]) -> Value {
    let permissions: Vec<Value> = permissions.iter().map(|p| json!({ "name": p })).collect();
    json!({
        "external_id": USER_ID,
        "username": "someone@example.org",
        "email": "someone@example.org",
        "disabled": false,
        "service_roles": [{
            "service": service_json(),
            "role": { "name": "admin", "permissions": permissions }
        }]
    })
}

pub fn account_json(provider: &str) -> Value {
    json!({
        "gateway_account_id": ACCOUNT_ID,
        "external_id": ACCOUNT_EXTERNAL_ID,
        "payment_provider": provider,
        "type": "test",
        "service_name": "Pay for a parking permit",
        "allow_apple_pay": false,
        "allow_google_pay": false,
        "requires3ds": false,
        "gateway_account_credentials": []
    })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-authenticated-user", USER_ID)
        .header("x-request-id", CORRELATION_ID)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-authenticated-user", USER_ID)
        .header("x-request-id", CORRELATION_ID)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `name=value` part of the session Set-Cookie header, ready to send back.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("selfservice_state="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

/// Decoded contents of the session cookie the response set.
pub fn session_data(resp: &Response<Body>) -> SessionData {
    let cookie = session_cookie(resp).expect("response should set the session cookie");
    let (_, value) = cookie.split_once('=').unwrap();
    session::decode(SESSION_KEY, value).expect("session cookie should verify")
}

/// `name=value` cookie carrying `data`, signed with the test key.
pub fn cookie_for(data: &SessionData) -> String {
    format!("{}={}", SESSION_COOKIE, session::encode(SESSION_KEY, data))
}

pub fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}
