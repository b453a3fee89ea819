use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardKind {
    Debit,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardType {
    pub id: String,
    pub brand: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub requires3ds: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardTypeList {
    #[serde(default)]
    pub card_types: Vec<CardType>,
}
