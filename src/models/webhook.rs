use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types a webhook can subscribe to.
pub const WEBHOOK_EVENT_TYPES: &[&str] = &[
    "card_payment_succeeded",
    "card_payment_captured",
    "card_payment_refunded",
    "card_payment_failed",
    "card_payment_expired",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub external_id: String,
    pub service_id: String,
    #[serde(default)]
    pub gateway_account_id: Option<String>,
    pub live: bool,
    pub callback_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: WebhookStatus,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhookRequest {
    pub service_id: String,
    pub gateway_account_id: String,
    pub live: bool,
    pub callback_url: String,
    pub description: String,
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningSecret {
    pub signing_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub external_id: String,
    pub created_date: DateTime<Utc>,
    pub event_type: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub latest_attempt: Option<serde_json::Value>,
    #[serde(default)]
    pub last_delivery_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessagePage {
    pub count: u64,
    pub page: u64,
    pub total: u64,
    #[serde(default)]
    pub results: Vec<WebhookMessage>,
}
