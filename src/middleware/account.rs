//! Resolves the gateway account and service a request is about.
//!
//! Runs on every account- or service-scoped route, after the user has been
//! loaded. Upstream failures while fetching the account are logged and
//! swallowed: the request carries on with no account, and the extractors
//! below turn a missing account or service into the error response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use super::correlation::{RequestContext, GATEWAY_ACCOUNT_ID, GATEWAY_ACCOUNT_TYPE, SERVICE_EXTERNAL_ID};
use crate::clients::connector::ConnectorApi;
use crate::clients::ClientError;
use crate::errors::AppError;
use crate::models::gateway_account::{AccountType, GatewayAccount};
use crate::models::service::Service;
use crate::models::user::User;
use crate::AppState;

/// Route parameters that identify an account and/or service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRouteParams {
    pub service_external_id: Option<String>,
    pub gateway_account_external_id: Option<String>,
    pub environment: Option<String>,
}

impl AccountRouteParams {
    pub fn from_map(params: &HashMap<String, String>) -> Self {
        let get = |k: &str| params.get(k).filter(|v| !v.is_empty()).cloned();
        Self {
            service_external_id: get("serviceExternalId"),
            gateway_account_external_id: get("gatewayAccountExternalId"),
            environment: get("environment"),
        }
    }

    /// Path prefix the request was addressed under, used to build redirects.
    pub fn base_path(&self) -> String {
        match (
            &self.service_external_id,
            &self.gateway_account_external_id,
            &self.environment,
        ) {
            (Some(s), Some(a), _) => format!("/service/{}/account/{}", s, a),
            (None, Some(a), _) => format!("/account/{}", a),
            (Some(s), None, Some(env)) => format!("/service/{}/{}", s, env),
            (Some(s), None, None) => format!("/service/{}", s),
            (None, None, _) => String::new(),
        }
    }
}

/// What the middleware attaches to the request.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub account: Option<GatewayAccount>,
    pub service: Option<Service>,
    pub is_live: bool,
    pub base_path: String,
}

/// Internal id of the resolved account, attached alongside
/// [`ResolvedRequest`] for code that needs nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentGatewayAccountId(pub i64);

fn log_fetch_failure(external_id: &str, err: &ClientError) {
    if err.is_not_found() {
        tracing::info!(
            gateway_account_external_id = %external_id,
            "Gateway account not found"
        );
    } else {
        tracing::error!(
            gateway_account_external_id = %external_id,
            error_code = ?err.error_code,
            error = %err.message,
            "Error retrieving gateway account"
        );
    }
}

async fn fetch_account(
    ctx: &RequestContext,
    params: &AccountRouteParams,
    connector: &dyn ConnectorApi,
) -> Option<GatewayAccount> {
    let (lookup, result) = if let Some(external_id) = &params.gateway_account_external_id {
        (
            external_id.clone(),
            connector.get_account_by_external_id(ctx, external_id).await,
        )
    } else {
        let service_id = params.service_external_id.as_deref()?;
        let account_type = params
            .environment
            .as_deref()
            .and_then(AccountType::from_environment)?;
        (
            format!("{}/{}", service_id, account_type),
            connector
                .get_account_by_service_and_type(ctx, service_id, account_type)
                .await,
        )
    };

    match result {
        Ok(account) => Some(account.decorate()),
        Err(e) => {
            log_fetch_failure(&lookup, &e);
            None
        }
    }
}

/// Pick the service from the user's roles. An explicit service id wins,
/// but only when it owns the resolved account; otherwise the service owning
/// the account is used.
pub fn find_service(
    user: Option<&User>,
    service_external_id: Option<&str>,
    account: Option<&GatewayAccount>,
) -> Option<Service> {
    let roles = &user?.service_roles;
    if let Some(id) = service_external_id {
        return roles
            .iter()
            .find(|sr| sr.service.external_id == id)
            .filter(|sr| {
                account.map_or(true, |a| sr.service.has_gateway_account(a.gateway_account_id))
            })
            .map(|sr| sr.service.clone());
    }
    let account = account?;
    roles
        .iter()
        .find(|sr| sr.service.has_gateway_account(account.gateway_account_id))
        .map(|sr| sr.service.clone())
}

/// Resolve the account and service for one request.
///
/// Fails only when the route carries neither identifier; every upstream
/// failure is logged and results in a missing account instead.
pub async fn resolve_service_and_account(
    ctx: &mut RequestContext,
    params: &AccountRouteParams,
    user: Option<&User>,
    connector: &dyn ConnectorApi,
) -> Result<ResolvedRequest, AppError> {
    if params.gateway_account_external_id.is_none() && params.service_external_id.is_none() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Could not resolve gateway account external ID or service external ID from request params"
        )));
    }

    let mut account = fetch_account(ctx, params, connector).await;

    if let Some(acc) = account.as_mut() {
        if acc.is_stripe() || acc.is_switching_to_stripe() {
            match connector
                .get_stripe_account_setup(ctx, acc.gateway_account_id)
                .await
            {
                Ok(progress) => acc.connector_gateway_account_stripe_progress = Some(progress),
                Err(e) => tracing::error!(
                    gateway_account_id = acc.gateway_account_id,
                    error_code = ?e.error_code,
                    error = %e.message,
                    "Error retrieving Stripe account setup progress"
                ),
            }
        }
        ctx.add_field(GATEWAY_ACCOUNT_ID, acc.gateway_account_id.to_string());
        ctx.add_field(GATEWAY_ACCOUNT_TYPE, acc.account_type.as_str());
    }

    let service = find_service(user, params.service_external_id.as_deref(), account.as_ref());
    if let Some(service) = &service {
        ctx.add_field(SERVICE_EXTERNAL_ID, service.external_id.as_str());
    }

    Ok(ResolvedRequest {
        account,
        service,
        is_live: params.environment.as_deref() == Some("live"),
        base_path: params.base_path(),
    })
}

/// Middleware wrapper around [`resolve_service_and_account`].
pub async fn account_middleware(
    State(state): State<Arc<AppState>>,
    params: Option<Path<HashMap<String, String>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Anonymous requests are rejected by the extractors; skip the upstream calls.
    let Some(user) = req.extensions().get::<User>().cloned() else {
        return Ok(next.run(req).await);
    };

    let params = params
        .map(|Path(p)| AccountRouteParams::from_map(&p))
        .unwrap_or_default();

    let mut ctx = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::from_headers(req.headers()));

    let resolved =
        resolve_service_and_account(&mut ctx, &params, Some(&user), state.connector.as_ref()).await?;

    if let Some(account) = &resolved.account {
        req.extensions_mut()
            .insert(CurrentGatewayAccountId(account.gateway_account_id));
    }
    req.extensions_mut().insert(resolved);
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

fn current_user(parts: &Parts) -> Result<User, AppError> {
    parts
        .extensions
        .get::<User>()
        .cloned()
        .ok_or(AppError::Unauthenticated)
}

fn resolved(parts: &Parts) -> Result<&ResolvedRequest, AppError> {
    parts.extensions.get::<ResolvedRequest>().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("account resolution did not run for this route"))
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentGatewayAccountId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentGatewayAccountId>()
            .copied()
            .ok_or_else(|| AppError::NotFound("gateway account".into()))
    }
}

/// An account-scoped request with user, account and service all present.
#[derive(Debug, Clone)]
pub struct AccountRequest {
    pub user: User,
    pub account: GatewayAccount,
    pub service: Service,
    pub is_live: bool,
    pub base_path: String,
}

impl AccountRequest {
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        super::permission::require(&self.user, &self.service, permission)
    }

    pub fn require_any(&self, permissions: &[&str]) -> Result<(), AppError> {
        super::permission::require_any(&self.user, &self.service, permissions)
    }

    /// Path under the prefix this request was addressed with.
    pub fn path(&self, suffix: &str) -> String {
        format!("{}/{}", self.base_path, suffix.trim_start_matches('/'))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AccountRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;
        let resolved = resolved(parts)?;
        let account = resolved
            .account
            .clone()
            .ok_or_else(|| AppError::NotFound("gateway account".into()))?;
        let service = resolved
            .service
            .clone()
            .ok_or_else(|| AppError::PermissionDenied("service access".into()))?;
        Ok(Self {
            user,
            account,
            service,
            is_live: resolved.is_live,
            base_path: resolved.base_path.clone(),
        })
    }
}

/// A service-scoped request; the account is not needed.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub user: User,
    pub service: Service,
    pub base_path: String,
}

impl ServiceRequest {
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        super::permission::require(&self.user, &self.service, permission)
    }

    pub fn path(&self, suffix: &str) -> String {
        format!("{}/{}", self.base_path, suffix.trim_start_matches('/'))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ServiceRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;
        let resolved = resolved(parts)?;
        let service = resolved
            .service
            .clone()
            .ok_or_else(|| AppError::NotFound("service".into()))?;
        Ok(Self {
            user,
            service,
            base_path: resolved.base_path.clone(),
        })
    }
}
