// src/aggregate/mod.rs
//! Metric Aggregator: fetch results + supplied business inputs → snapshots.
//!
//! Required business inputs are `Option`s at the serde layer so an absent
//! value surfaces as a [`ValidationError`] naming the field instead of a
//! silent zero.

pub mod competitor;
pub mod financial;
pub mod rounding;
pub mod website;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::ValidationError;
use crate::fetch::types::FetchResult;
use competitor::{derive_competitors, CompetitorInputs, CompetitorMetrics};
use financial::{derive_financial, FinancialInputs, FinancialMetrics};
use website::{derive_website, WebsiteInputs, WebsiteMetrics};

/// Externally supplied raw inputs for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatorInputs {
    pub website: Option<WebsiteInputs>,
    /// Market estimates keyed by source name.
    #[serde(default)]
    pub competitors: HashMap<String, CompetitorInputs>,
    pub financial: Option<FinancialInputs>,
}

impl AggregatorInputs {
    /// Load from an explicit path. Supports JSON or TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading aggregator inputs from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "toml" => toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display())),
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display())),
            other => Err(anyhow!("unsupported inputs format: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub website: WebsiteMetrics,
    pub competitors: CompetitorMetrics,
    pub financial: FinancialMetrics,
}

/// Derive all three snapshots. Fails on the first missing or malformed
/// required input.
pub fn aggregate(
    results: &[FetchResult],
    inputs: &AggregatorInputs,
    today: NaiveDate,
) -> Result<MetricSnapshot, ValidationError> {
    let website = derive_website(inputs.website.as_ref())?;
    let competitors = derive_competitors(results, &inputs.competitors)?;
    let financial = derive_financial(inputs.financial.as_ref(), today)?;
    Ok(MetricSnapshot {
        website,
        competitors,
        financial,
    })
}

pub(crate) fn require<'a, T>(v: Option<&'a T>, field: &str) -> Result<&'a T, ValidationError> {
    v.ok_or_else(|| ValidationError::missing(field))
}

/// A ratio on the 0..1 scale.
pub(crate) fn require_ratio(v: Option<f64>, field: &str) -> Result<f64, ValidationError> {
    let x = *require(v.as_ref(), field)?;
    if !x.is_finite() || !(0.0..=1.0).contains(&x) {
        return Err(ValidationError::malformed(field, format!("{x} is not a 0..1 ratio")));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INPUTS_JSON: &str = r#"{
        "website": {
            "visitors": { "total": 12000, "unique": 8000, "returning": 2500, "bounce_rate": 0.31 },
            "engagement": { "avg_session_duration_secs": 190, "pages_per_session": 3.2, "conversion_rate": 0.041 },
            "traffic_sources": { "organic_search": 55, "direct": 25 }
        },
        "competitors": {},
        "financial": {
            "costs": [
                { "category": "development", "amount": 15000, "recurring": false },
                { "category": "hosting", "amount": 900, "recurring": true }
            ],
            "revenue": { "licensing": 1200 }
        }
    }"#;

    #[test]
    fn empty_fetch_set_aggregates() {
        let inputs: AggregatorInputs = serde_json::from_str(INPUTS_JSON).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        let snap = aggregate(&[], &inputs, today).unwrap();
        assert!(snap.competitors.is_empty());
        assert_eq!(snap.financial.monthly_profit, 300.0);
        assert_eq!(snap.website.visitors.bounce_rate_pct, 31.0);
    }

    #[test]
    fn missing_section_is_reported() {
        let mut inputs: AggregatorInputs = serde_json::from_str(INPUTS_JSON).unwrap();
        inputs.financial = None;
        let today = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        assert_eq!(
            aggregate(&[], &inputs, today).unwrap_err(),
            ValidationError::missing("financial")
        );
    }

    #[test]
    fn loads_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("inputs.json");
        fs::write(&json, INPUTS_JSON).unwrap();
        let a = AggregatorInputs::load_from(&json).unwrap();
        assert!(a.website.is_some());

        let toml_path = dir.path().join("inputs.toml");
        fs::write(
            &toml_path,
            r#"
            [financial]
            revenue = { sales = 10.0 }
            [[financial.costs]]
            category = "development"
            amount = 5.0
            recurring = false
            "#,
        )
        .unwrap();
        let b = AggregatorInputs::load_from(&toml_path).unwrap();
        assert!(b.website.is_none());
        assert_eq!(b.financial.unwrap().costs.unwrap().len(), 1);

        let txt = dir.path().join("inputs.txt");
        fs::write(&txt, "").unwrap();
        assert!(AggregatorInputs::load_from(&txt).is_err());
    }
}
