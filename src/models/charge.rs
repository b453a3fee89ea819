use serde::{Deserialize, Serialize};

/// Body for creating a charge on connector.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub amount: u64,
    pub description: String,
    pub reference: String,
    pub return_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeState {
    pub status: String,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub charge_id: String,
    pub amount: u64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub state: ChargeState,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Charge {
    /// The hosted payment page to send the paying user to.
    pub fn next_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "next_url")
            .map(|l| l.href.as_str())
    }

    pub fn succeeded(&self) -> bool {
        self.state.status == "success"
    }
}

/// Body for a refund request against connector.
#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    pub amount: u64,
    pub refund_amount_available: u64,
    pub user_external_id: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_url_from_links() {
        let charge: Charge = serde_json::from_value(serde_json::json!({
            "charge_id": "ch_1",
            "amount": 500,
            "state": { "status": "created", "finished": false },
            "links": [
                { "rel": "self", "href": "http://connector/v1/api/accounts/1/charges/ch_1", "method": "GET" },
                { "rel": "next_url", "href": "https://card.example/secure/abc", "method": "GET" }
            ]
        }))
        .unwrap();
        assert_eq!(charge.next_url(), Some("https://card.example/secure/abc"));
        assert!(!charge.succeeded());
    }
}
