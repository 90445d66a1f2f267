use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Orchestrator-assigned identity of one unit within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitKey(pub u64);

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{:04}", self.0)
    }
}

impl Serialize for UnitKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whatever the page patterns matched. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    /// Source page, so a record can be traced back once keys are renumbered.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "tax")]
    pub tax_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_with_tax: Option<f64>,
}

impl ScrapedItem {
    pub fn new(url: impl Into<String>, fields: ExtractedFields, tax_rate: f64) -> Self {
        let price_with_tax = fields
            .price
            .map(|price| crate::pricing::price_with_tax(price, tax_rate));
        Self {
            url: url.into(),
            name: fields.name,
            description: fields.description,
            price: fields.price,
            tax_rate,
            price_with_tax,
        }
    }
}
