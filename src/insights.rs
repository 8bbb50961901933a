//! Narrative insights attached to a report. The default provider is a static
//! lookup filled in with a few headline figures.

use serde::{Deserialize, Serialize};

use crate::aggregate::competitor::CompetitorMetrics;
use crate::aggregate::financial::FinancialMetrics;
use crate::aggregate::website::WebsiteMetrics;
use crate::alert::AlertSet;

/// Industry reference conversion rate, in percent.
pub const INDUSTRY_CONVERSION_PCT: f64 = 2.5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub website_insights: Vec<String>,
    pub competitive_insights: Vec<String>,
    pub growth_recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

pub struct InsightContext<'a> {
    pub website: &'a WebsiteMetrics,
    pub competitors: &'a CompetitorMetrics,
    pub financial: &'a FinancialMetrics,
    pub alerts: &'a AlertSet,
}

pub trait InsightProvider: Send + Sync {
    fn insights(&self, ctx: &InsightContext<'_>) -> Insights;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInsights;

impl InsightProvider for StaticInsights {
    fn insights(&self, ctx: &InsightContext<'_>) -> Insights {
        let conv = ctx.website.engagement.conversion_rate_pct;
        let mut website_insights = vec![if conv > INDUSTRY_CONVERSION_PCT {
            format!("Conversion rate of {conv}% beats the industry average ({INDUSTRY_CONVERSION_PCT}%)")
        } else {
            format!("Conversion rate of {conv}% trails the industry average ({INDUSTRY_CONVERSION_PCT}%)")
        }];
        if let Some(organic) = ctx.website.traffic_sources.get("organic_search") {
            website_insights.push(format!(
                "Organic search brings {organic}% of traffic; SEO strategy is paying off"
            ));
        }
        website_insights.push(format!(
            "Bounce rate at {}% across {} visitors",
            ctx.website.visitors.bounce_rate_pct, ctx.website.visitors.total
        ));

        let mut competitive_insights: Vec<String> = ctx
            .alerts
            .alerts
            .iter()
            .map(|a| format!("{} is moving: {}", a.source, a.reason))
            .collect();
        if let Some(top) = ctx
            .competitors
            .entries
            .iter()
            .max_by_key(|c| c.estimated_traffic)
        {
            competitive_insights.push(format!(
                "{} leads estimated traffic with {} monthly visits",
                top.name, top.estimated_traffic
            ));
        }
        competitive_insights.extend(
            [
                "Ahead of incumbents on digital innovation",
                "Differentiated VIP service can capture the premium segment",
                "Automation gives an operational efficiency edge",
            ]
            .map(String::from),
        );

        let mut risk_factors: Vec<String> = [
            "Competitors accelerating their digital transformation",
            "Regulatory changes in legal services",
            "Demand for legal services falling in a downturn",
        ]
        .map(String::from)
        .to_vec();
        if !ctx.financial.break_even_months.is_reachable() {
            risk_factors.insert(
                0,
                "Recurring costs exceed revenue; the initial investment is not recovered".into(),
            );
        }

        Insights {
            website_insights,
            competitive_insights,
            growth_recommendations: [
                "Build a mobile app to widen client touchpoints",
                "Introduce an AI chatbot for 24/7 consultations",
                "Develop data-driven, tailored legal services",
                "Add multilingual support ahead of global expansion",
            ]
            .map(String::from)
            .to_vec(),
            risk_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, AggregatorInputs};
    use crate::alert::{Alert, Severity};
    use chrono::NaiveDate;

    fn snapshot(revenue: u32) -> crate::aggregate::MetricSnapshot {
        let inputs: AggregatorInputs = serde_json::from_str(&format!(
            r#"{{
                "website": {{
                    "visitors": {{ "total": 900, "unique": 700, "returning": 100, "bounce_rate": 0.4 }},
                    "engagement": {{ "avg_session_duration_secs": 60, "pages_per_session": 2, "conversion_rate": 0.01 }}
                }},
                "financial": {{
                    "costs": [
                        {{ "category": "build", "amount": 5000, "recurring": false }},
                        {{ "category": "ops", "amount": 800, "recurring": true }}
                    ],
                    "revenue": {{ "fees": {revenue} }}
                }}
            }}"#
        ))
        .unwrap();
        aggregate(&[], &inputs, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap()).unwrap()
    }

    #[test]
    fn weak_conversion_and_losses_are_called_out() {
        let snap = snapshot(500);
        let out = StaticInsights.insights(&InsightContext {
            website: &snap.website,
            competitors: &snap.competitors,
            financial: &snap.financial,
            alerts: &AlertSet::default(),
        });
        assert!(out.website_insights[0].contains("trails"));
        assert!(out.risk_factors[0].contains("not recovered"));
        // No organic split supplied, no competitors observed.
        assert_eq!(out.website_insights.len(), 2);
        assert_eq!(out.competitive_insights.len(), 3);
    }

    #[test]
    fn alerts_lead_the_competitive_section() {
        let snap = snapshot(2_000);
        let alerts = AlertSet {
            alerts: vec![Alert {
                source: "Acme".into(),
                severity: Severity::Critical,
                reason: "12 significant changes (website 4, news 4, jobs 4)".into(),
                change_count: 12,
            }],
        };
        let out = StaticInsights.insights(&InsightContext {
            website: &snap.website,
            competitors: &snap.competitors,
            financial: &snap.financial,
            alerts: &alerts,
        });
        assert_eq!(
            out.competitive_insights[0],
            "Acme is moving: 12 significant changes (website 4, news 4, jobs 4)"
        );
        assert_eq!(out.risk_factors.len(), 3);
    }
}
