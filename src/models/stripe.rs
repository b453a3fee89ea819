use serde::{Deserialize, Serialize};

/// Onboarding progress for a Stripe gateway account.
///
/// Connector sends snake_case flags; views consume camelCase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct StripeAccountSetup {
    pub bank_account: bool,
    pub responsible_person: bool,
    pub vat_number: bool,
    pub company_number: bool,
    pub director: bool,
    pub government_entity_document: bool,
    pub organisation_details: bool,
}

impl StripeAccountSetup {
    /// Steps still outstanding, in the order they are presented.
    pub fn outstanding(&self) -> Vec<StripeSetupStep> {
        StripeSetupStep::ALL
            .iter()
            .copied()
            .filter(|step| !self.is_complete(*step))
            .collect()
    }

    pub fn is_complete(&self, step: StripeSetupStep) -> bool {
        match step {
            StripeSetupStep::BankAccount => self.bank_account,
            StripeSetupStep::ResponsiblePerson => self.responsible_person,
            StripeSetupStep::VatNumber => self.vat_number,
            StripeSetupStep::CompanyNumber => self.company_number,
            StripeSetupStep::Director => self.director,
            StripeSetupStep::GovernmentEntityDocument => self.government_entity_document,
            StripeSetupStep::OrganisationDetails => self.organisation_details,
        }
    }
}

/// A connector stripe-setup flag, named by its JSON-patch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StripeSetupStep {
    BankAccount,
    ResponsiblePerson,
    VatNumber,
    CompanyNumber,
    Director,
    GovernmentEntityDocument,
    OrganisationDetails,
}

impl StripeSetupStep {
    pub const ALL: [StripeSetupStep; 7] = [
        StripeSetupStep::BankAccount,
        StripeSetupStep::ResponsiblePerson,
        StripeSetupStep::VatNumber,
        StripeSetupStep::CompanyNumber,
        StripeSetupStep::Director,
        StripeSetupStep::GovernmentEntityDocument,
        StripeSetupStep::OrganisationDetails,
    ];

    pub fn patch_path(&self) -> &'static str {
        match self {
            StripeSetupStep::BankAccount => "bank_account",
            StripeSetupStep::ResponsiblePerson => "responsible_person",
            StripeSetupStep::VatNumber => "vat_number",
            StripeSetupStep::CompanyNumber => "company_number",
            StripeSetupStep::Director => "director",
            StripeSetupStep::GovernmentEntityDocument => "government_entity_document",
            StripeSetupStep::OrganisationDetails => "organisation_details",
        }
    }
}

/// The Stripe connected account backing a gateway account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct StripeAccount {
    pub stripe_account_id: String,
}

/// A Stripe person as returned by the persons list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePerson {
    pub id: String,
    #[serde(default)]
    pub relationship: StripePersonRelationship,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripePersonRelationship {
    #[serde(default)]
    pub representative: bool,
    #[serde(default)]
    pub director: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePersonList {
    #[serde(default)]
    pub data: Vec<StripePerson>,
}
