//! Gateway account as returned by connector.
//!
//! Connector is the service of record. This service only reads accounts per
//! request and mutates them through PATCH calls back to connector.

use serde::{Deserialize, Serialize};

use super::stripe::StripeAccountSetup;

/// Providers for which 3DS can be configured.
pub const PROVIDERS_SUPPORTING_3DS: &[&str] = &["worldpay", "stripe", "epdq", "smartpay"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Test,
    Live,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Test => "test",
            AccountType::Live => "live",
        }
    }

    /// Maps the `environment` route parameter onto an account type.
    pub fn from_environment(environment: &str) -> Option<Self> {
        match environment {
            "live" => Some(AccountType::Live),
            "test" => Some(AccountType::Test),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialState {
    Created,
    Entered,
    VerifiedWithLivePayment,
    Active,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAccountCredential {
    pub external_id: String,
    pub payment_provider: String,
    pub state: CredentialState,
    #[serde(default)]
    pub credentials: serde_json::Value,
    #[serde(default)]
    pub gateway_account_credential_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAccount {
    pub gateway_account_id: i64,
    pub external_id: String,
    pub payment_provider: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub analytics_id: Option<String>,
    #[serde(default)]
    pub allow_apple_pay: bool,
    #[serde(default)]
    pub allow_google_pay: bool,
    #[serde(default)]
    pub allow_moto: bool,
    #[serde(default)]
    pub moto_mask_card_number_input: bool,
    #[serde(default)]
    pub moto_mask_card_security_code_input: bool,
    #[serde(default)]
    pub requires3ds: bool,
    #[serde(default)]
    pub integration_version_3ds: Option<u8>,
    #[serde(default)]
    pub provider_switch_enabled: bool,
    #[serde(default)]
    pub recurring_enabled: bool,
    #[serde(default)]
    pub gateway_account_credentials: Vec<GatewayAccountCredential>,

    /// Derived on resolution, never sent by connector.
    #[serde(default, skip_deserializing)]
    pub supports3ds: bool,
    #[serde(default, skip_deserializing)]
    pub disable_toggle3ds: bool,
    #[serde(default, skip_deserializing)]
    pub connector_gateway_account_stripe_progress: Option<StripeAccountSetup>,
}

impl GatewayAccount {
    pub fn is_live(&self) -> bool {
        self.account_type == AccountType::Live
    }

    pub fn is_stripe(&self) -> bool {
        self.payment_provider == "stripe"
    }

    /// True when the account has a pending (not yet active) Stripe credential
    /// while a provider switch is in progress.
    pub fn is_switching_to_stripe(&self) -> bool {
        self.provider_switch_enabled
            && self.gateway_account_credentials.iter().any(|c| {
                c.payment_provider == "stripe"
                    && !matches!(c.state, CredentialState::Active | CredentialState::Retired)
            })
    }

    pub fn supports_3ds(&self) -> bool {
        PROVIDERS_SUPPORTING_3DS.contains(&self.payment_provider.as_str())
    }

    /// Fill in the derived flags.
    pub fn decorate(mut self) -> Self {
        self.supports3ds = self.supports_3ds();
        self.disable_toggle3ds = self.is_stripe();
        self
    }

    pub fn active_credential(&self) -> Option<&GatewayAccountCredential> {
        self.gateway_account_credentials
            .iter()
            .find(|c| c.state == CredentialState::Active)
    }
}
