//! Per-request correlation context.
//!
//! Every inbound request gets a [`RequestContext`] holding the correlation id
//! (taken from `x-request-id` or freshly generated) and a small set of log
//! fields added while the request is handled. The context lives in request
//! extensions and is passed explicitly to every upstream client call, so
//! nothing is shared between requests.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

pub const CORRELATION_HEADER: &str = "x-request-id";

pub const GATEWAY_ACCOUNT_ID: &str = "gateway_account_id";
pub const GATEWAY_ACCOUNT_TYPE: &str = "gateway_account_type";
pub const SERVICE_EXTERNAL_ID: &str = "service_external_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
    fields: BTreeMap<&'static str, String>,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Reuse the inbound correlation id when there is a usable one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::new)
            .unwrap_or_else(Self::generate)
    }

    /// Add a log field and record it on the current request span.
    pub fn add_field(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        tracing::Span::current().record(key, value.as_str());
        self.fields.insert(key, value);
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, String> {
        &self.fields
    }
}

/// Middleware: enters the correlation context for the lifetime of the request.
pub async fn correlation_middleware(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::from_headers(req.headers());
    let correlation_id = ctx.correlation_id.clone();

    let span = tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %req.method(),
        path = %req.uri().path(),
        gateway_account_id = tracing::field::Empty,
        gateway_account_type = tracing::field::Empty,
        service_external_id = tracing::field::Empty,
    );

    req.extensions_mut().insert(ctx);
    let mut resp = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        resp.headers_mut().insert(CORRELATION_HEADER, val);
    }
    resp
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_headers(&parts.headers)))
    }
}
