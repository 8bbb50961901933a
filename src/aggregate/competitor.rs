//! Per-competitor scoring: supplied market estimates joined with what the
//! fetch stage observed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::rounding::{percent, ratio_to_percent};
use super::{require, require_ratio};
use crate::error::ValidationError;
use crate::fetch::types::{ChangeCounters, FetchResult, FetchStatus};
use crate::registry::Priority;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitorInputs {
    pub estimated_traffic: Option<u64>,
    /// 0..100
    pub seo_score: Option<f64>,
    /// 0..1
    pub market_share: Option<f64>,
    #[serde(default)]
    pub social_mentions: u64,
    #[serde(default)]
    pub news_coverage: u64,
    #[serde(default)]
    pub recruitment_activity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub name: String,
    pub priority: Priority,
    pub fetch_status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_matches: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeCounters>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_content: Vec<String>,
    pub estimated_traffic: u64,
    pub seo_score: f64,
    pub social_mentions: u64,
    pub news_coverage: u64,
    pub recruitment_activity: u64,
    pub market_share_estimate_pct: f64,
    pub competitive_advantage: Vec<String>,
}

/// One snapshot per fetch result, in fetch (registry) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorMetrics {
    pub entries: Vec<CompetitorSnapshot>,
}

impl CompetitorMetrics {
    pub fn get(&self, name: &str) -> Option<&CompetitorSnapshot> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn derive_competitors(
    results: &[FetchResult],
    inputs: &HashMap<String, CompetitorInputs>,
) -> Result<CompetitorMetrics, ValidationError> {
    let mut entries = Vec::with_capacity(results.len());
    for r in results {
        let field = |f: &str| format!("competitors.{}.{}", r.name, f);
        let input = require(inputs.get(&r.name), &format!("competitors.{}", r.name))?;

        let traffic = *require(input.estimated_traffic.as_ref(), &field("estimated_traffic"))?;
        let seo = *require(input.seo_score.as_ref(), &field("seo_score"))?;
        if !seo.is_finite() || !(0.0..=100.0).contains(&seo) {
            return Err(ValidationError::malformed(
                field("seo_score"),
                format!("{seo} is outside 0..100"),
            ));
        }
        let share = require_ratio(input.market_share, &field("market_share"))?;

        let observation = r.observation.as_ref();
        entries.push(CompetitorSnapshot {
            name: r.name.clone(),
            priority: r.priority,
            fetch_status: r.status,
            keyword_matches: observation.map(|o| o.keyword_matches),
            changes: observation.map(|o| o.changes),
            new_content: observation.map(|o| o.new_content.clone()).unwrap_or_default(),
            estimated_traffic: traffic,
            seo_score: percent(seo),
            social_mentions: input.social_mentions,
            news_coverage: input.news_coverage,
            recruitment_activity: input.recruitment_activity,
            market_share_estimate_pct: ratio_to_percent(share),
            competitive_advantage: competitive_advantage(&r.name),
        });
    }
    Ok(CompetitorMetrics { entries })
}

/// Static commentary per competitor; unknown names get a generic profile.
pub fn competitive_advantage(name: &str) -> Vec<String> {
    let key = name.trim().to_lowercase();
    let notes: &[&str] = match key.as_str() {
        "kim & chang" => &[
            "M&A expertise",
            "Expanding global network",
            "Digital transformation",
        ],
        "bae, kim & lee" => &[
            "Corporate practice focus",
            "Growing startup support",
            "Fintech legal services",
        ],
        "lee & ko" => &[
            "International arbitration specialization",
            "Stronger IP practice",
            "New environmental law practice",
        ],
        "jipyong" => &[
            "Tax law expertise",
            "Real estate development",
            "SME support programs",
        ],
        _ => &[
            "General legal services",
            "Traditional approach",
            "Stable operations",
        ],
    };
    notes.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::types::Observation;
    use crate::registry::MonitoredSource;
    use chrono::{TimeZone, Utc};

    fn input() -> CompetitorInputs {
        CompetitorInputs {
            estimated_traffic: Some(120_000),
            seo_score: Some(88.0),
            market_share: Some(0.184),
            social_mentions: 310,
            news_coverage: 22,
            recruitment_activity: 9,
        }
    }

    fn results() -> Vec<FetchResult> {
        let at = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let ok = MonitoredSource::new("Kim & Chang", "https://a", ["news"], Priority::High);
        let down = MonitoredSource::new("Newcomer LLC", "https://b", ["news"], Priority::Low);
        vec![
            FetchResult::success(
                &ok,
                Observation {
                    keyword_matches: 11,
                    ..Default::default()
                },
                at,
            ),
            FetchResult::failure(
                &down,
                &FetchError::Failed {
                    source_name: "Newcomer LLC".into(),
                    detail: "dns".into(),
                },
                at,
            ),
        ]
    }

    #[test]
    fn one_snapshot_per_result_in_order() {
        let inputs = HashMap::from([
            ("Kim & Chang".to_string(), input()),
            ("Newcomer LLC".to_string(), input()),
        ]);
        let m = derive_competitors(&results(), &inputs).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.entries[0].name, "Kim & Chang");
        assert_eq!(m.entries[0].keyword_matches, Some(11));
        assert_eq!(m.entries[0].market_share_estimate_pct, 18.4);
        assert_eq!(m.entries[0].competitive_advantage[0], "M&A expertise");

        let down = m.get("Newcomer LLC").unwrap();
        assert_eq!(down.fetch_status, FetchStatus::Error);
        assert!(down.changes.is_none());
        assert_eq!(down.competitive_advantage[0], "General legal services");
    }

    #[test]
    fn missing_inputs_name_the_source() {
        let inputs = HashMap::from([("Kim & Chang".to_string(), input())]);
        let err = derive_competitors(&results(), &inputs).unwrap_err();
        assert_eq!(err.field(), "competitors.Newcomer LLC");

        let mut partial = input();
        partial.seo_score = None;
        let inputs = HashMap::from([
            ("Kim & Chang".to_string(), partial),
            ("Newcomer LLC".to_string(), input()),
        ]);
        let err = derive_competitors(&results(), &inputs).unwrap_err();
        assert_eq!(err.field(), "competitors.Kim & Chang.seo_score");
    }

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(competitive_advantage("Nobody & Co").len(), 3);
        assert_eq!(competitive_advantage("  JIPYONG ")[0], "Tax law expertise");
    }
}
