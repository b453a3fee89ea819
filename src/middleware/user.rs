//! Loads the authenticated user from adminusers.
//!
//! Sign-in happens in the fronting auth layer, which passes the user's
//! external id in a trusted header. A missing header or unknown user leaves
//! the request anonymous; routes that need a user reject it later.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::correlation::RequestContext;
use crate::errors::AppError;
use crate::AppState;

pub async fn user_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(state.config.auth_user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    if let Some(user_id) = user_id {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::generate);

        match state.adminusers.get_user(&ctx, &user_id).await {
            Ok(user) if user.disabled => {
                tracing::info!(user_external_id = %user_id, "ignoring disabled user");
            }
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(user_external_id = %user_id, "authenticated user not found in adminusers");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(next.run(req).await)
}
