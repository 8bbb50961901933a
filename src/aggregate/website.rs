//! Website performance: unit conversion and rounding only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rounding::{percent, ratio_to_percent, round_to};
use super::{require, require_ratio};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitorInputs {
    pub total: Option<u64>,
    pub unique: Option<u64>,
    pub returning: Option<u64>,
    /// 0..1
    pub bounce_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementInputs {
    pub avg_session_duration_secs: Option<f64>,
    pub pages_per_session: Option<f64>,
    /// 0..1
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViews {
    pub path: String,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteInputs {
    pub visitors: Option<VisitorInputs>,
    pub engagement: Option<EngagementInputs>,
    /// Percent per channel. Independently observed, so they need not sum to 100.
    #[serde(default)]
    pub traffic_sources: BTreeMap<String, f64>,
    #[serde(default)]
    pub top_pages: Vec<PageViews>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorMetrics {
    pub total: u64,
    pub unique: u64,
    pub returning: u64,
    pub bounce_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub avg_session_duration_secs: u64,
    pub pages_per_session: f64,
    pub conversion_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteMetrics {
    pub visitors: VisitorMetrics,
    pub engagement: EngagementMetrics,
    pub traffic_sources: BTreeMap<String, f64>,
    pub top_pages: Vec<PageViews>,
}

pub fn derive_website(inputs: Option<&WebsiteInputs>) -> Result<WebsiteMetrics, ValidationError> {
    let inputs = require(inputs, "website")?;
    let v = require(inputs.visitors.as_ref(), "website.visitors")?;
    let e = require(inputs.engagement.as_ref(), "website.engagement")?;

    let total = *require(v.total.as_ref(), "website.visitors.total")?;
    let unique = *require(v.unique.as_ref(), "website.visitors.unique")?;
    let returning = *require(v.returning.as_ref(), "website.visitors.returning")?;
    if unique > total {
        return Err(ValidationError::malformed(
            "website.visitors.unique",
            format!("{unique} unique visitors exceed {total} total"),
        ));
    }
    let bounce = require_ratio(v.bounce_rate, "website.visitors.bounce_rate")?;

    let duration = require_non_negative(
        e.avg_session_duration_secs,
        "website.engagement.avg_session_duration_secs",
    )?;
    let pages = require_non_negative(e.pages_per_session, "website.engagement.pages_per_session")?;
    let conversion = require_ratio(e.conversion_rate, "website.engagement.conversion_rate")?;

    let mut traffic_sources = BTreeMap::new();
    for (channel, pct) in &inputs.traffic_sources {
        if !pct.is_finite() || !(0.0..=100.0).contains(pct) {
            return Err(ValidationError::malformed(
                format!("website.traffic_sources.{channel}"),
                format!("{pct} is not a percentage"),
            ));
        }
        traffic_sources.insert(channel.clone(), percent(*pct));
    }

    let mut top_pages = inputs.top_pages.clone();
    top_pages.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.path.cmp(&b.path)));

    Ok(WebsiteMetrics {
        visitors: VisitorMetrics {
            total,
            unique,
            returning,
            bounce_rate_pct: ratio_to_percent(bounce),
        },
        engagement: EngagementMetrics {
            avg_session_duration_secs: duration.round() as u64,
            pages_per_session: round_to(pages, 1),
            conversion_rate_pct: ratio_to_percent(conversion),
        },
        traffic_sources,
        top_pages,
    })
}

fn require_non_negative(v: Option<f64>, field: &str) -> Result<f64, ValidationError> {
    let x = *require(v.as_ref(), field)?;
    if !x.is_finite() || x < 0.0 {
        return Err(ValidationError::malformed(field, format!("{x} is negative or not finite")));
    }
    Ok(x)
}
