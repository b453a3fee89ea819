//! Transaction search filters.
//!
//! Filters arrive as a query string (repeated keys for multi-selects),
//! are echoed back to the view as entered and are translated into ledger
//! query parameters.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::clients::ledger::QueryPairs;

/// Display state → (ledger parameter, ledger states).
const DISPLAY_STATES: &[(&str, &str, &[&str])] = &[
    ("In progress", "payment_states", &["created", "started", "submitted", "capturable"]),
    ("Success", "payment_states", &["success"]),
    ("Declined", "payment_states", &["declined"]),
    ("Timed out", "payment_states", &["timedout"]),
    ("Cancelled", "payment_states", &["cancelled"]),
    ("Error", "payment_states", &["error"]),
    ("Refund submitted", "refund_states", &["submitted"]),
    ("Refund success", "refund_states", &["success"]),
    ("Refund error", "refund_states", &["error"]),
    ("Dispute awaiting evidence", "dispute_states", &["needs_response"]),
    ("Dispute under review", "dispute_states", &["under_review"]),
    ("Dispute won", "dispute_states", &["won"]),
    ("Dispute lost", "dispute_states", &["lost"]),
];

const STATE_PARAMS: [&str; 3] = ["payment_states", "refund_states", "dispute_states"];

pub fn display_states() -> Vec<&'static str> {
    DISPLAY_STATES.iter().map(|(name, _, _)| *name).collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Enter a valid {0} date in the format dd/mm/yyyy")]
    InvalidDate(&'static str),
    #[error("Enter a valid {0} time in the format hh:mm:ss")]
    InvalidTime(&'static str),
    #[error("The start date must be before the end date")]
    DateRange,
    #[error("Unknown payment status '{0}'")]
    UnknownState(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    pub reference: Option<String>,
    pub email: Option<String>,
    pub cardholder_name: Option<String>,
    pub last_digits_card_number: Option<String>,
    pub metadata_value: Option<String>,
    pub agreement_id: Option<String>,
    pub from_date: Option<String>,
    pub from_time: Option<String>,
    pub to_date: Option<String>,
    pub to_time: Option<String>,
    pub brands: Vec<String>,
    pub states: Vec<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

fn non_blank(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

impl TransactionFilters {
    /// Parse a raw query string. Unknown keys are ignored; `brand` and
    /// `state` may repeat or be comma separated.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filters = Self::default();
        let Some(query) = query else {
            return filters;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.as_ref();
            match key.as_ref() {
                "reference" => filters.reference = non_blank(value),
                "email" => filters.email = non_blank(value),
                "cardholderName" => filters.cardholder_name = non_blank(value),
                "lastDigitsCardNumber" => filters.last_digits_card_number = non_blank(value),
                "metadataValue" => filters.metadata_value = non_blank(value),
                "agreementId" => filters.agreement_id = non_blank(value),
                "fromDate" => filters.from_date = non_blank(value),
                "fromTime" => filters.from_time = non_blank(value),
                "toDate" => filters.to_date = non_blank(value),
                "toTime" => filters.to_time = non_blank(value),
                "brand" => filters
                    .brands
                    .extend(value.split(',').filter_map(non_blank)),
                "state" => filters
                    .states
                    .extend(value.split(',').filter_map(non_blank)),
                "page" => filters.page = value.trim().parse().ok().filter(|p| *p > 0),
                "pageSize" => filters.page_size = value.trim().parse().ok().filter(|p| *p > 0),
                _ => {}
            }
        }
        filters
    }

    pub fn has_any(&self) -> bool {
        self.reference.is_some()
            || self.email.is_some()
            || self.cardholder_name.is_some()
            || self.last_digits_card_number.is_some()
            || self.metadata_value.is_some()
            || self.agreement_id.is_some()
            || self.from_date.is_some()
            || self.to_date.is_some()
            || !self.brands.is_empty()
            || !self.states.is_empty()
    }

    /// Ledger query parameters for these filters, excluding paging.
    pub fn to_ledger_query(&self) -> Result<QueryPairs, FilterError> {
        let mut query: QueryPairs = Vec::new();
        let mut push = |k: &str, v: &Option<String>| {
            if let Some(v) = v {
                query.push((k.to_string(), v.clone()));
            }
        };
        push("reference", &self.reference);
        push("email", &self.email);
        push("cardholder_name", &self.cardholder_name);
        push("last_digits_card_number", &self.last_digits_card_number);
        push("metadata_value", &self.metadata_value);
        push("agreement_id", &self.agreement_id);

        let from = self
            .from_date
            .as_deref()
            .map(|d| start_of(d, self.from_time.as_deref()))
            .transpose()?;
        let to = self
            .to_date
            .as_deref()
            .map(|d| end_of(d, self.to_time.as_deref()))
            .transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Err(FilterError::DateRange);
            }
        }
        if let Some(from) = from {
            query.push(("from_date".into(), iso(from)));
        }
        if let Some(to) = to {
            query.push(("to_date".into(), iso(to)));
        }

        if !self.brands.is_empty() {
            query.push(("card_brands".into(), self.brands.join(",")));
        }

        for param in STATE_PARAMS {
            let mut states: Vec<&str> = Vec::new();
            for display in &self.states {
                let (_, target, mapped) = DISPLAY_STATES
                    .iter()
                    .find(|(name, _, _)| name.eq_ignore_ascii_case(display))
                    .ok_or_else(|| FilterError::UnknownState(display.clone()))?;
                if *target != param {
                    continue;
                }
                for state in mapped.iter() {
                    if !states.contains(state) {
                        states.push(state);
                    }
                }
            }
            if !states.is_empty() {
                query.push((param.to_string(), states.join(",")));
            }
        }

        Ok(query)
    }
}

fn iso(dt: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&dt)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date(value: &str, which: &'static str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value, "%d/%m/%Y").map_err(|_| FilterError::InvalidDate(which))
}

fn parse_time(value: &str, which: &'static str) -> Result<NaiveTime, FilterError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| FilterError::InvalidTime(which))
}

fn start_of(date: &str, time: Option<&str>) -> Result<NaiveDateTime, FilterError> {
    let date = parse_date(date, "start")?;
    let time = match time {
        Some(t) => parse_time(t, "start")?,
        None => NaiveTime::MIN,
    };
    Ok(date.and_time(time))
}

/// The end bound is exclusive: a bare date covers the whole day and an
/// explicit time covers that whole second.
fn end_of(date: &str, time: Option<&str>) -> Result<NaiveDateTime, FilterError> {
    let date = parse_date(date, "end")?;
    Ok(match time {
        Some(t) => date.and_time(parse_time(t, "end")?) + Duration::seconds(1),
        None => date.and_time(NaiveTime::MIN) + Duration::days(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(q: &QueryPairs) -> Vec<(&str, &str)> {
        q.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_parses_repeated_and_comma_separated_multi_values() {
        let f = TransactionFilters::from_query(Some(
            "reference=ref123&brand=visa&brand=master-card,amex&state=Success&state=Refund+success&page=3",
        ));
        assert_eq!(f.reference.as_deref(), Some("ref123"));
        assert_eq!(f.brands, vec!["visa", "master-card", "amex"]);
        assert_eq!(f.states, vec!["Success", "Refund success"]);
        assert_eq!(f.page, Some(3));
        assert!(f.has_any());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let f = TransactionFilters::from_query(Some("reference=&email=%20&page=0"));
        assert_eq!(f, TransactionFilters::default());
        assert!(!f.has_any());
    }

    #[test]
    fn test_ledger_query_contains_exactly_the_filters() {
        let f = TransactionFilters::from_query(Some(
            "reference=ref123&fromDate=01/03/2024&toDate=31/03/2024&brand=visa&state=Success",
        ));
        let q = f.to_ledger_query().unwrap();
        assert_eq!(
            pairs(&q),
            vec![
                ("reference", "ref123"),
                ("from_date", "2024-03-01T00:00:00.000Z"),
                ("to_date", "2024-04-01T00:00:00.000Z"),
                ("card_brands", "visa"),
                ("payment_states", "success"),
            ]
        );
    }

    #[test]
    fn test_times_narrow_the_range() {
        let f = TransactionFilters::from_query(Some(
            "fromDate=01/03/2024&fromTime=09:30:00&toDate=01/03/2024&toTime=17:00:00",
        ));
        let q = f.to_ledger_query().unwrap();
        assert_eq!(q[0].1, "2024-03-01T09:30:00.000Z");
        assert_eq!(q[1].1, "2024-03-01T17:00:01.000Z");
    }

    #[test]
    fn test_states_split_across_ledger_parameters() {
        let f = TransactionFilters::from_query(Some(
            "state=In+progress&state=Refund+submitted&state=Dispute+lost",
        ));
        let q = f.to_ledger_query().unwrap();
        assert_eq!(
            pairs(&q),
            vec![
                ("payment_states", "created,started,submitted,capturable"),
                ("refund_states", "submitted"),
                ("dispute_states", "lost"),
            ]
        );
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let f = TransactionFilters::from_query(Some("fromDate=2024-03-01"));
        assert_eq!(f.to_ledger_query(), Err(FilterError::InvalidDate("start")));

        let f = TransactionFilters::from_query(Some("fromDate=02/03/2024&toDate=01/03/2024"));
        assert_eq!(f.to_ledger_query(), Err(FilterError::DateRange));

        let f = TransactionFilters::from_query(Some("state=Pending"));
        assert_eq!(f.to_ledger_query(), Err(FilterError::UnknownState("Pending".into())));
    }

    #[test]
    fn test_agreement_filter_is_passed_through() {
        let f = TransactionFilters::from_query(Some("agreementId=agr-1&page=2"));
        assert!(f.has_any());
        assert_eq!(
            pairs(&f.to_ledger_query().unwrap()),
            vec![("agreement_id", "agr-1")]
        );
    }
}
