use serde::Serialize;

/// A single JSON-patch style operation, as accepted by connector, webhooks
/// and adminusers PATCH endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOp {
    pub fn replace(path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "replace",
            path: path.into(),
            value: value.into(),
        }
    }
}
