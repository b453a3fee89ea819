//! View models handed to the rendering layer.
//!
//! Handlers return a template name plus a JSON context; turning that into
//! HTML happens outside this service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct View {
    template: &'static str,
    context: Value,
    status: StatusCode,
}

impl View {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self {
            template,
            context,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Attach flash messages consumed from the session.
    pub fn with_flash(mut self, flash: std::collections::BTreeMap<String, Vec<String>>) -> Self {
        if let Value::Object(map) = &mut self.context {
            map.insert("flash".into(), json!(flash));
        }
        self
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "template": self.template,
                "context": self.context,
            })),
        )
            .into_response()
    }
}
