//! Stripe onboarding: the task list and validation of each form.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::clients::stripe::ResponsiblePerson;
use crate::models::stripe::{StripeAccountSetup, StripeSetupStep};

static SORT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").unwrap());
static ACCOUNT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6,8}$").unwrap());
static VAT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(GB)?(\d{9}|\d{12}|GD\d{3}|HA\d{3})$").unwrap());
static COMPANY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8}|[A-Z]{2}\d{6})$").unwrap());
static POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,2}\d[A-Z\d]? ?\d[A-Z]{2}$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[\d ()-]{10,20}$").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const MAX_NAME_LENGTH: usize = 100;

/// Field name → error message, in form order.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub step: StripeSetupStep,
    pub path: &'static str,
    pub complete: bool,
}

/// Tasks shown on the Stripe details page, limited to the steps this
/// service collects.
pub fn task_list(setup: &StripeAccountSetup) -> Vec<Task> {
    [
        (StripeSetupStep::BankAccount, "stripe-setup/bank-details"),
        (StripeSetupStep::ResponsiblePerson, "stripe-setup/responsible-person"),
        (StripeSetupStep::VatNumber, "stripe-setup/vat-number"),
        (StripeSetupStep::CompanyNumber, "stripe-setup/company-number"),
    ]
    .into_iter()
    .map(|(step, path)| Task {
        step,
        path,
        complete: setup.is_complete(step),
    })
    .collect()
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

pub fn normalise_sort_code(value: &str) -> Result<String, &'static str> {
    let v = compact(value);
    if v.is_empty() {
        return Err("Enter a sort code");
    }
    SORT_CODE
        .is_match(&v)
        .then_some(v)
        .ok_or("Enter a valid sort code like 309430")
}

pub fn normalise_account_number(value: &str) -> Result<String, &'static str> {
    let v = compact(value);
    if v.is_empty() {
        return Err("Enter an account number");
    }
    ACCOUNT_NUMBER
        .is_match(&v)
        .then_some(v)
        .ok_or("Enter a valid account number like 00733445")
}

pub fn normalise_vat_number(value: &str) -> Result<String, &'static str> {
    let v = compact(value);
    if v.is_empty() {
        return Err("Enter a VAT registration number");
    }
    VAT_NUMBER
        .is_match(&v)
        .then_some(v)
        .ok_or("Enter a valid VAT registration number")
}

pub fn normalise_company_number(value: &str) -> Result<String, &'static str> {
    let v = compact(value);
    if v.is_empty() {
        return Err("Enter a company registration number");
    }
    COMPANY_NUMBER
        .is_match(&v)
        .then_some(v)
        .ok_or("Enter a valid company registration number")
}

/// Raw responsible person form as posted.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResponsiblePersonForm {
    pub first_name: String,
    pub last_name: String,
    pub home_address_line_1: String,
    pub home_address_line_2: String,
    pub home_address_city: String,
    pub home_address_postcode: String,
    pub dob_day: String,
    pub dob_month: String,
    pub dob_year: String,
    pub telephone_number: String,
    pub email: String,
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    missing: &'static str,
) -> String {
    let v = value.trim();
    if v.is_empty() {
        errors.insert(field, missing);
    } else if v.chars().count() > MAX_NAME_LENGTH {
        errors.insert(field, "Must be 100 characters or fewer");
    }
    v.to_string()
}

fn parse_dob(form: &ResponsiblePersonForm) -> Option<NaiveDate> {
    let day = form.dob_day.trim().parse().ok()?;
    let month = form.dob_month.trim().parse().ok()?;
    let year = form.dob_year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

impl ResponsiblePersonForm {
    pub fn validate(&self) -> Result<ResponsiblePerson, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = required(&mut errors, "first-name", &self.first_name, "Enter a first name");
        let last_name = required(&mut errors, "last-name", &self.last_name, "Enter a last name");
        let address_line1 = required(
            &mut errors,
            "home-address-line-1",
            &self.home_address_line_1,
            "Enter a building and street",
        );
        let address_city = required(
            &mut errors,
            "home-address-city",
            &self.home_address_city,
            "Enter a town or city",
        );

        let postcode = self.home_address_postcode.trim().to_uppercase();
        if postcode.is_empty() {
            errors.insert("home-address-postcode", "Enter a postcode");
        } else if !POSTCODE.is_match(&postcode) {
            errors.insert("home-address-postcode", "Enter a real postcode");
        }

        let dob = parse_dob(self);
        match dob {
            None => {
                errors.insert("dob", "Enter a valid date of birth");
            }
            Some(d) if d.year() < 1900 || d >= Utc::now().date_naive() => {
                errors.insert("dob", "Date of birth must be in the past");
            }
            Some(_) => {}
        }

        let phone = self.telephone_number.trim();
        if phone.is_empty() {
            errors.insert("telephone-number", "Enter a work telephone number");
        } else if !PHONE.is_match(phone) {
            errors.insert("telephone-number", "Enter a telephone number, like 01632 960 001");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "Enter a work email address");
        } else if !EMAIL.is_match(email) {
            errors.insert("email", "Enter a real email address");
        }

        match dob {
            Some(dob) if errors.is_empty() => Ok(ResponsiblePerson {
                first_name,
                last_name,
                address_line1,
                address_line2: Some(self.home_address_line_2.trim().to_string())
                    .filter(|l| !l.is_empty()),
                address_city,
                address_postcode: postcode,
                dob_day: dob.day(),
                dob_month: dob.month(),
                dob_year: dob.year(),
                phone: phone.to_string(),
                email: email.to_string(),
            }),
            _ => Err(errors),
        }
    }
}
