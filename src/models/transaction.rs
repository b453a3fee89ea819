//! Read-only projections from ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionState {
    pub status: String,
    #[serde(default)]
    pub finished: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub cardholder_name: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub last_digits_card_number: Option<String>,
    #[serde(default)]
    pub first_digits_card_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundSummary {
    pub status: String,
    #[serde(default)]
    pub amount_available: u64,
    #[serde(default)]
    pub amount_submitted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Payment,
    Refund,
    Dispute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub gateway_account_id: String,
    pub amount: u64,
    #[serde(default)]
    pub total_amount: Option<u64>,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub net_amount: Option<i64>,
    pub state: TransactionState,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub card_details: Option<CardDetails>,
    pub created_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub refund_summary: Option<RefundSummary>,
    #[serde(default)]
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub gateway_transaction_id: Option<String>,
    #[serde(default)]
    pub parent_transaction_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub live: bool,
}

impl Transaction {
    /// Amount still refundable, when the payment can be refunded at all.
    pub fn refundable_amount(&self) -> Option<u64> {
        match &self.refund_summary {
            Some(s) if s.status == "available" && s.amount_available > 0 => Some(s.amount_available),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Href {
    pub href: String,
}

/// HAL-ish paging links returned with every ledger search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchLinks {
    #[serde(default, rename = "self")]
    pub self_link: Option<Href>,
    #[serde(default)]
    pub first_page: Option<Href>,
    #[serde(default)]
    pub last_page: Option<Href>,
    #[serde(default)]
    pub prev_page: Option<Href>,
    #[serde(default)]
    pub next_page: Option<Href>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub total: u64,
    pub count: u64,
    pub page: u64,
    pub results: Vec<T>,
    #[serde(default, rename = "_links")]
    pub links: SearchLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub state: Option<TransactionState>,
    pub resource_type: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvents {
    pub transaction_id: String,
    #[serde(default)]
    pub events: Vec<TransactionEvent>,
}
