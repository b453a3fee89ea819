//! Thin REST clients for the backend services.
//!
//! Every client wraps a [`BaseClient`], which owns the shared per-call
//! configuration: correlation header injection and request logging via a
//! `reqwest-middleware` layer. Clients never retry and never catch: a non-2xx
//! response becomes a [`ClientError`] carrying the HTTP status as
//! `error_code`, and callers decide what to do with it.

use std::time::{Duration, Instant};

use reqwest::header::HeaderValue;
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::middleware::correlation::{RequestContext, CORRELATION_HEADER};

pub mod adminusers;
pub mod connector;
pub mod ledger;
pub mod products;
pub mod publicauth;
pub mod stripe;
pub mod webhooks;

/// Failure of a single upstream call.
#[derive(Debug, Clone, Error)]
#[error("{service} call failed ({}): {message}", status_label(.error_code))]
pub struct ClientError {
    pub service: &'static str,
    /// HTTP status of the upstream response; `None` when no response arrived.
    pub error_code: Option<u16>,
    pub message: String,
    pub body: Option<serde_json::Value>,
}

fn status_label(code: &Option<u16>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "no response".to_string())
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        self.error_code == Some(404)
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self.error_code, Some(400..=499))
    }

    fn network(service: &'static str, err: reqwest_middleware::Error) -> Self {
        Self {
            service,
            error_code: None,
            message: err.to_string(),
            body: None,
        }
    }

    fn decode(service: &'static str, status: u16, err: reqwest::Error) -> Self {
        Self {
            service,
            error_code: Some(status),
            message: format!("could not decode response: {}", err),
            body: None,
        }
    }

    async fn from_response(service: &'static str, resp: reqwest::Response) -> Self {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text).ok();
        let message = body
            .as_ref()
            .and_then(upstream_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("upstream error")
                    .to_string()
            });
        Self {
            service,
            error_code: Some(status.as_u16()),
            message,
            body,
        }
    }
}

/// Pull a human message out of the shapes our backends use for errors:
/// `{"message": "..."}`, `{"message": ["..."]}`, `{"errors": ["..."]}` and
/// Stripe's `{"error": {"message": "..."}}`.
fn upstream_message(body: &serde_json::Value) -> Option<String> {
    let join = |v: &serde_json::Value| -> Option<String> {
        match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            _ => None,
        }
    };
    body.get("message")
        .and_then(join)
        .or_else(|| body.get("errors").and_then(join))
        .or_else(|| body.pointer("/error/message").and_then(join))
}

/// Substitute `{name}` placeholders with URL-encoded values.
pub fn render_path(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), &urlencoding::encode(value))
    })
}

/// Correlation id carried on each outbound request's extensions.
#[derive(Debug, Clone)]
struct CorrelationId(String);

/// Shared per-call configuration: stamps the correlation header and logs
/// start, completion and failure of every upstream call.
struct RequestLogging {
    service: &'static str,
}

#[async_trait::async_trait]
impl Middleware for RequestLogging {
    async fn handle(
        &self,
        mut req: reqwest::Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let correlation_id = extensions
            .get::<CorrelationId>()
            .map(|c| c.0.clone())
            .unwrap_or_default();
        if let Ok(val) = HeaderValue::from_str(&correlation_id) {
            if !correlation_id.is_empty() {
                req.headers_mut().insert(CORRELATION_HEADER, val);
            }
        }

        let method = req.method().clone();
        let path = req.url().path().to_string();
        let started = Instant::now();
        tracing::debug!(
            service = self.service,
            method = %method,
            url = %path,
            correlation_id = %correlation_id,
            "calling {} {} {}", self.service, method, path
        );

        let result = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(resp) if resp.status().is_server_error() => tracing::error!(
                service = self.service,
                method = %method,
                url = %path,
                status = resp.status().as_u16(),
                elapsed_ms,
                correlation_id = %correlation_id,
                "{} call failed with server error", self.service
            ),
            Ok(resp) => tracing::info!(
                service = self.service,
                method = %method,
                url = %path,
                status = resp.status().as_u16(),
                elapsed_ms,
                correlation_id = %correlation_id,
                "{} call completed", self.service
            ),
            Err(e) => tracing::error!(
                service = self.service,
                method = %method,
                url = %path,
                elapsed_ms,
                correlation_id = %correlation_id,
                error = %e,
                "{} call failed", self.service
            ),
        }

        result
    }
}

/// HTTP plumbing shared by every backend client.
#[derive(Clone)]
pub struct BaseClient {
    service: &'static str,
    base_url: String,
    http: ClientWithMiddleware,
}

impl BaseClient {
    pub fn new(service: &'static str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(16)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let http = ClientBuilder::new(reqwest_client)
            .with(RequestLogging { service })
            .build();

        Ok(Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn url(&self, template: &str, params: &[(&str, &str)]) -> String {
        format!("{}{}", self.base_url, render_path(template, params))
    }

    pub fn request(&self, ctx: &RequestContext, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .with_extension(CorrelationId(ctx.correlation_id.clone()))
    }

    /// Send and fail on any non-2xx status.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ClientError::network(self.service, e))?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(ClientError::from_response(self.service, resp).await)
        }
    }

    pub async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.execute(builder).await?;
        let status = resp.status().as_u16();
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::decode(self.service, status, e))
    }

    pub async fn empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.execute(builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_path_encodes_params() {
        assert_eq!(
            render_path(
                "/v1/api/accounts/{accountId}/charges/{chargeId}",
                &[("accountId", "42"), ("chargeId", "a b/c")]
            ),
            "/v1/api/accounts/42/charges/a%20b%2Fc"
        );
    }

    #[test]
    fn test_upstream_message_shapes() {
        assert_eq!(upstream_message(&json!({ "message": "nope" })).as_deref(), Some("nope"));
        assert_eq!(
            upstream_message(&json!({ "message": ["a", "b"] })).as_deref(),
            Some("a, b")
        );
        assert_eq!(
            upstream_message(&json!({ "errors": ["Field [x] is required"] })).as_deref(),
            Some("Field [x] is required")
        );
        assert_eq!(
            upstream_message(&json!({ "error": { "message": "Invalid sort code" } })).as_deref(),
            Some("Invalid sort code")
        );
        assert_eq!(upstream_message(&json!({ "other": 1 })), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BaseClient::new("connector", "http://connector:9300/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url("/v1/api/accounts/{id}", &[("id", "1")]),
            "http://connector:9300/v1/api/accounts/1"
        );
    }
}
