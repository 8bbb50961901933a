//! # Report Builder
//! All-or-nothing assembly of the dated report.
//!
//! The JSON shape (`report_id`, `generated_at`, `period`, `executive_summary`,
//! `detailed_metrics`, `insights`, `next_review_date`) is consumed downstream;
//! alerts and the monitoring tally live inside `executive_summary`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::competitor::CompetitorMetrics;
use crate::aggregate::financial::FinancialMetrics;
use crate::aggregate::website::WebsiteMetrics;
use crate::aggregate::MetricSnapshot;
use crate::alert::AlertSet;
use crate::error::PipelineError;
use crate::fetch::types::FetchSummary;
use crate::insights::{
    InsightContext, InsightProvider, Insights, StaticInsights, INDUSTRY_CONVERSION_PCT,
};

pub const DEFAULT_REPORT_PREFIX: &str = "COMPETITIVE-ANALYTICS";
/// Longest accepted review interval: ten years.
pub const MAX_REVIEW_INTERVAL_DAYS: u32 = 3_660;

fn default_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_string()
}
fn default_review_interval_days() -> u32 {
    7
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_review_interval_days")]
    pub review_interval_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            review_interval_days: default_review_interval_days(),
        }
    }
}

/// `<prefix>-<YYYY-MM-DD>`: stable for every run on the same calendar day.
pub fn report_id(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}", prefix, date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub overall_performance: String,
    pub key_achievements: Vec<String>,
    pub critical_actions: Vec<String>,
    pub monitoring: FetchSummary,
    pub escalation_required: bool,
    pub alerts: AlertSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedMetrics {
    pub website: WebsiteMetrics,
    pub competitors: CompetitorMetrics,
    pub financial: FinancialMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub period: String,
    pub executive_summary: ExecutiveSummary,
    pub detailed_metrics: DetailedMetrics,
    pub insights: Insights,
    pub next_review_date: NaiveDate,
}

impl Report {
    pub fn escalation_required(&self) -> bool {
        self.executive_summary.escalation_required
    }

    pub fn alerts(&self) -> &AlertSet {
        &self.executive_summary.alerts
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Collects every part of a report; `build` refuses to emit a partial one.
pub struct ReportBuilder<'a> {
    settings: &'a ReportSettings,
    generated_at: DateTime<Utc>,
    monitoring: Option<FetchSummary>,
    website: Option<WebsiteMetrics>,
    competitors: Option<CompetitorMetrics>,
    financial: Option<FinancialMetrics>,
    alerts: Option<AlertSet>,
    insights: &'a dyn InsightProvider,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(settings: &'a ReportSettings, generated_at: DateTime<Utc>) -> Self {
        Self {
            settings,
            generated_at,
            monitoring: None,
            website: None,
            competitors: None,
            financial: None,
            alerts: None,
            insights: &StaticInsights,
        }
    }

    pub fn with_monitoring(mut self, summary: FetchSummary) -> Self {
        self.monitoring = Some(summary);
        self
    }

    pub fn with_website(mut self, m: WebsiteMetrics) -> Self {
        self.website = Some(m);
        self
    }

    pub fn with_competitors(mut self, m: CompetitorMetrics) -> Self {
        self.competitors = Some(m);
        self
    }

    pub fn with_financial(mut self, m: FinancialMetrics) -> Self {
        self.financial = Some(m);
        self
    }

    pub fn with_snapshot(self, s: MetricSnapshot) -> Self {
        self.with_website(s.website)
            .with_competitors(s.competitors)
            .with_financial(s.financial)
    }

    pub fn with_alerts(mut self, alerts: AlertSet) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_insights(mut self, provider: &'a dyn InsightProvider) -> Self {
        self.insights = provider;
        self
    }

    pub fn build(self) -> Result<Report, PipelineError> {
        let monitoring = self.monitoring.ok_or(PipelineError::Incomplete("monitoring summary"))?;
        let website = self.website.ok_or(PipelineError::Incomplete("website metrics"))?;
        let competitors = self
            .competitors
            .ok_or(PipelineError::Incomplete("competitor metrics"))?;
        let financial = self
            .financial
            .ok_or(PipelineError::Incomplete("financial metrics"))?;
        let alerts = self.alerts.ok_or(PipelineError::Incomplete("alerts"))?;

        let insights = self.insights.insights(&InsightContext {
            website: &website,
            competitors: &competitors,
            financial: &financial,
            alerts: &alerts,
        });

        let run_date = self.generated_at.date_naive();
        let interval = self.settings.review_interval_days;
        let next_review_date = Duration::try_days(i64::from(interval))
            .and_then(|d| self.generated_at.checked_add_signed(d))
            .ok_or_else(|| {
                PipelineError::Fatal(anyhow::anyhow!(
                    "review interval of {interval} days leaves the calendar range"
                ))
            })?
            .date_naive();

        let executive_summary = ExecutiveSummary {
            overall_performance: overall_performance(&financial, &alerts).to_string(),
            key_achievements: key_achievements(&website, &financial, &monitoring),
            critical_actions: critical_actions(&financial, &alerts, &monitoring),
            escalation_required: alerts.escalation_required(),
            monitoring,
            alerts,
        };

        Ok(Report {
            report_id: report_id(&self.settings.prefix, run_date),
            generated_at: self.generated_at,
            period: format!("as of {}", run_date.format("%Y-%m-%d")),
            executive_summary,
            detailed_metrics: DetailedMetrics {
                website,
                competitors,
                financial,
            },
            insights,
            next_review_date,
        })
    }
}

fn overall_performance(financial: &FinancialMetrics, alerts: &AlertSet) -> &'static str {
    match (financial.monthly_profit > 0.0, alerts.escalation_required()) {
        (true, false) => "excellent",
        (true, true) => "good",
        (false, _) => "needs attention",
    }
}

fn key_achievements(
    website: &WebsiteMetrics,
    financial: &FinancialMetrics,
    monitoring: &FetchSummary,
) -> Vec<String> {
    let conv = website.engagement.conversion_rate_pct;
    let vs_industry = (conv / INDUSTRY_CONVERSION_PCT * 100.0).round();
    vec![
        format!("Website conversion rate at {vs_industry}% of the industry average"),
        format!(
            "{} of {} competitors monitored successfully",
            monitoring.succeeded, monitoring.total
        ),
        format!("Monthly net profit of {}", format_money(financial.monthly_profit)),
    ]
}

fn critical_actions(
    financial: &FinancialMetrics,
    alerts: &AlertSet,
    monitoring: &FetchSummary,
) -> Vec<String> {
    let mut out = Vec::new();
    if alerts.escalation_required() {
        out.push(format!(
            "Escalate to the VIP hotline: significant changes at {}",
            alerts.sources().join(", ")
        ));
    }
    if monitoring.failed > 0 {
        out.push(format!(
            "Investigate {} failed source fetch(es)",
            monitoring.failed
        ));
    }
    if !financial.break_even_months.is_reachable() {
        out.push("Cut recurring costs: break-even is unreachable at current revenue".into());
    }
    out.extend(
        [
            "Strengthen mobile optimization",
            "Evaluate AI adoption",
            "Prepare for global market entry",
        ]
        .map(String::from),
    );
    out
}

/// `$1,234.50`, `-$1,000.00`
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}
