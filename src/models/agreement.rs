use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstrument {
    #[serde(default)]
    pub card_details: Option<super::transaction::CardDetails>,
    #[serde(default, rename = "type")]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

/// A recurring-payment agreement, as projected by ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub external_id: String,
    pub service_id: String,
    pub reference: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub user_identifier: Option<String>,
    #[serde(default)]
    pub payment_instrument: Option<PaymentInstrument>,
    #[serde(default)]
    pub cancelled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_by_user_email: Option<String>,
}

pub const AGREEMENT_STATUSES: &[&str] = &["created", "active", "cancelled", "expired"];
