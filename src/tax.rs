use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct TaxEntry {
    #[serde(rename = "State")]
    jurisdiction: String,
    #[serde(rename = "State Tax Rate")]
    rate: f64,
}

/// Jurisdiction → flat sales-tax rate, in reference-file order.
#[derive(Debug, Clone, Default)]
pub struct TaxTable {
    entries: Vec<(String, f64)>,
}

impl TaxTable {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read tax table {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid tax table {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: Vec<TaxEntry> = serde_json::from_str(raw)?;
        let entries = parsed
            .into_iter()
            .filter_map(|entry| {
                if entry.rate.is_finite() && entry.rate >= 0.0 {
                    Some((entry.jurisdiction, entry.rate))
                } else {
                    tracing::warn!(
                        target: "batch",
                        jurisdiction = %entry.jurisdiction,
                        rate = entry.rate,
                        "ignoring tax entry with invalid rate"
                    );
                    None
                }
            })
            .collect();
        Ok(Self { entries })
    }

    /// First exact match wins; unknown jurisdictions are untaxed.
    pub fn rate_for(&self, jurisdiction: &str) -> f64 {
        self.entries
            .iter()
            .find(|(name, _)| name == jurisdiction)
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
