//! Card types page: every card connector knows about, marked with whether
//! the account accepts it and whether it can be selected at all.

use serde::Serialize;

use crate::models::card_type::{CardKind, CardType};
use crate::models::gateway_account::GatewayAccount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTypeOption {
    pub id: String,
    pub brand: String,
    pub label: String,
    pub selected: bool,
    /// Cards that require 3DS cannot be accepted while 3DS is off.
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardTypesView {
    pub debit: Vec<CardTypeOption>,
    pub credit: Vec<CardTypeOption>,
}

pub fn build_view(all: &[CardType], accepted: &[CardType], account: &GatewayAccount) -> CardTypesView {
    let mut view = CardTypesView::default();
    for card in all {
        let option = CardTypeOption {
            id: card.id.clone(),
            brand: card.brand.clone(),
            label: card.label.clone(),
            selected: accepted.iter().any(|a| a.id == card.id),
            available: !card.requires3ds || account.requires3ds,
        };
        match card.kind {
            CardKind::Debit => view.debit.push(option),
            CardKind::Credit => view.credit.push(option),
        }
    }
    view
}

/// Card type ids ticked on the form (`debit` and `credit` checkboxes).
pub fn selected_ids(form_body: &[u8]) -> Vec<String> {
    url::form_urlencoded::parse(form_body)
        .filter(|(k, _)| k == "debit" || k == "credit")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Ids the account may actually accept: unknown ids are dropped, as are
/// 3DS-only cards when 3DS is off.
pub fn acceptable_ids(selected: &[String], all: &[CardType], account: &GatewayAccount) -> Vec<String> {
    all.iter()
        .filter(|c| selected.contains(&c.id))
        .filter(|c| !c.requires3ds || account.requires3ds)
        .map(|c| c.id.clone())
        .collect()
}
