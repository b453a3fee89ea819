//! Stripe connected-account updates made during onboarding.
//!
//! Stripe takes form-encoded bodies with bracketed keys, authenticated with
//! the platform secret key.

use std::time::Duration;

use reqwest::Method;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::stripe::{StripePerson, StripePersonList};

type Form = Vec<(String, String)>;

/// The person legally responsible for the Stripe account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiblePerson {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub address_city: String,
    pub address_postcode: String,
    pub dob_day: u32,
    pub dob_month: u32,
    pub dob_year: i32,
    pub phone: String,
    pub email: String,
}

impl ResponsiblePerson {
    fn to_form(&self) -> Form {
        let mut form: Form = vec![
            ("first_name".into(), self.first_name.clone()),
            ("last_name".into(), self.last_name.clone()),
            ("address[line1]".into(), self.address_line1.clone()),
            ("address[city]".into(), self.address_city.clone()),
            ("address[postal_code]".into(), self.address_postcode.clone()),
            ("address[country]".into(), "GB".into()),
            ("dob[day]".into(), self.dob_day.to_string()),
            ("dob[month]".into(), self.dob_month.to_string()),
            ("dob[year]".into(), self.dob_year.to_string()),
            ("phone".into(), self.phone.clone()),
            ("email".into(), self.email.clone()),
            ("relationship[representative]".into(), "true".into()),
        ];
        if let Some(line2) = self.address_line2.as_ref().filter(|l| !l.is_empty()) {
            form.push(("address[line2]".into(), line2.clone()));
        }
        form
    }
}

#[derive(Clone)]
pub struct StripeClient {
    base: BaseClient,
    secret_key: String,
}

impl StripeClient {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("stripe", base_url, timeout)?,
            secret_key: secret_key.to_string(),
        })
    }

    async fn post_form(&self, ctx: &RequestContext, url: &str, form: &Form) -> Result<(), ClientError> {
        let req = self
            .base
            .request(ctx, Method::POST, url)
            .bearer_auth(&self.secret_key)
            .form(form);
        self.base.empty(req).await
    }

    pub async fn update_bank_account(
        &self,
        ctx: &RequestContext,
        stripe_account_id: &str,
        sort_code: &str,
        account_number: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url("/v1/accounts/{accountId}", &[("accountId", stripe_account_id)]);
        let form: Form = vec![
            ("external_account[object]".into(), "bank_account".into()),
            ("external_account[country]".into(), "GB".into()),
            ("external_account[currency]".into(), "GBP".into()),
            ("external_account[routing_number]".into(), sort_code.to_string()),
            ("external_account[account_number]".into(), account_number.to_string()),
        ];
        self.post_form(ctx, &url, &form).await
    }

    pub async fn update_vat_number(
        &self,
        ctx: &RequestContext,
        stripe_account_id: &str,
        vat_number: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url("/v1/accounts/{accountId}", &[("accountId", stripe_account_id)]);
        let form: Form = vec![("company[vat_id]".into(), vat_number.to_string())];
        self.post_form(ctx, &url, &form).await
    }

    pub async fn update_company_number(
        &self,
        ctx: &RequestContext,
        stripe_account_id: &str,
        company_number: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url("/v1/accounts/{accountId}", &[("accountId", stripe_account_id)]);
        let form: Form = vec![("company[tax_id]".into(), company_number.to_string())];
        self.post_form(ctx, &url, &form).await
    }

    pub async fn list_persons(
        &self,
        ctx: &RequestContext,
        stripe_account_id: &str,
    ) -> Result<Vec<StripePerson>, ClientError> {
        let url = self.base.url("/v1/accounts/{accountId}/persons", &[("accountId", stripe_account_id)]);
        let req = self
            .base
            .request(ctx, Method::GET, &url)
            .bearer_auth(&self.secret_key);
        let list: StripePersonList = self.base.json(req).await?;
        Ok(list.data)
    }

    /// Update the existing representative if there is one, otherwise create it.
    pub async fn upsert_responsible_person(
        &self,
        ctx: &RequestContext,
        stripe_account_id: &str,
        person: &ResponsiblePerson,
    ) -> Result<(), ClientError> {
        let existing = self
            .list_persons(ctx, stripe_account_id)
            .await?
            .into_iter()
            .find(|p| p.relationship.representative);

        let url = match existing {
            Some(p) => self.base.url(
                "/v1/accounts/{accountId}/persons/{personId}",
                &[("accountId", stripe_account_id), ("personId", &p.id)],
            ),
            None => self.base.url("/v1/accounts/{accountId}/persons", &[("accountId", stripe_account_id)]),
        };
        self.post_form(ctx, &url, &person.to_form()).await
    }
}
