use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Adhoc,
    Demo,
    Prototype,
    Agent,
}

/// Body for creating a payment link on products.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProductRequest {
    pub gateway_account_id: i64,
    pub pay_api_token: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub service_name_path: String,
    pub product_name_path: String,
    pub reference_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_hint: Option<String>,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLink {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub external_id: String,
    pub gateway_account_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub reference_enabled: bool,
    #[serde(default)]
    pub reference_label: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub service_name_path: Option<String>,
    #[serde(default)]
    pub product_name_path: Option<String>,
    #[serde(default, rename = "_links")]
    pub links: Vec<ProductLink>,
}

impl Product {
    pub fn friendly_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "friendly")
            .or_else(|| self.links.iter().find(|l| l.rel == "pay"))
            .map(|l| l.href.as_str())
    }

    /// Public URL of the link: the `friendly` or `pay` link when products
    /// returned one, else built from the slugs under `friendly_base`.
    pub fn public_url(&self, friendly_base: &str) -> Option<String> {
        if let Some(url) = self.friendly_url() {
            return Some(url.to_string());
        }
        match (&self.service_name_path, &self.product_name_path) {
            (Some(service), Some(product)) => Some(format!(
                "{}/{}/{}",
                friendly_base.trim_end_matches('/'),
                service,
                product
            )),
            _ => None,
        }
    }
}
