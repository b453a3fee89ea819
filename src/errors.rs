use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::api::view::View;
use crate::clients::ClientError;

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const NOT_FOUND_MESSAGE: &str = "Page not found";
pub const PERMISSION_DENIED_MESSAGE: &str =
    "You do not have the administrator rights to perform this operation.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(what) => {
                tracing::info!("not found: {}", what);
                NOT_FOUND_MESSAGE.to_string()
            }
            AppError::Unauthenticated => "You must sign in to view this page".to_string(),
            AppError::PermissionDenied(permission) => {
                tracing::info!(permission = %permission, "permission denied");
                PERMISSION_DENIED_MESSAGE.to_string()
            }
            AppError::BadRequest(reason) => reason.clone(),
            AppError::Upstream(e) if e.is_not_found() => {
                tracing::info!(service = e.service, "upstream resource not found: {}", e.message);
                NOT_FOUND_MESSAGE.to_string()
            }
            AppError::Upstream(e) => {
                tracing::error!(
                    service = e.service,
                    error_code = ?e.error_code,
                    "upstream error: {}",
                    e.message
                );
                GENERIC_ERROR_MESSAGE.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                GENERIC_ERROR_MESSAGE.to_string()
            }
        };

        View::new("error", json!({ "message": message }))
            .with_status(status)
            .into_response()
    }
}
