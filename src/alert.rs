//! # Alert Evaluator
//!
//! Escalates HIGH-priority sources whose observed change volume crosses a
//! threshold. MEDIUM/LOW sources and failed fetches never alert.

use serde::{Deserialize, Serialize};

use crate::fetch::types::FetchResult;
use crate::registry::Priority;

fn default_min_significant_changes() -> u32 {
    1
}
fn default_critical_changes() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThreshold {
    /// Smallest change count that raises an alert. Default 1: any nonzero counter.
    #[serde(default = "default_min_significant_changes")]
    pub min_significant_changes: u32,
    /// Change count at which the alert becomes CRITICAL.
    #[serde(default = "default_critical_changes")]
    pub critical_changes: u32,
}

impl Default for AlertThreshold {
    fn default() -> Self {
        Self {
            min_significant_changes: default_min_significant_changes(),
            critical_changes: default_critical_changes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub source: String,
    pub severity: Severity,
    pub reason: String,
    pub change_count: u32,
}

/// Alerts raised in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertSet {
    pub alerts: Vec<Alert>,
}

impl AlertSet {
    pub fn escalation_required(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn sources(&self) -> Vec<&str> {
        self.alerts.iter().map(|a| a.source.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEvaluator {
    threshold: AlertThreshold,
}

impl AlertEvaluator {
    pub fn new(threshold: AlertThreshold) -> Self {
        // A zero minimum would alert on quiet sources.
        let threshold = AlertThreshold {
            min_significant_changes: threshold.min_significant_changes.max(1),
            ..threshold
        };
        Self { threshold }
    }

    pub fn evaluate(&self, results: &[FetchResult]) -> AlertSet {
        let alerts = results
            .iter()
            .filter(|r| r.priority == Priority::High)
            .filter_map(|r| {
                let obs = r.observation.as_ref().filter(|_| r.is_success())?;
                let c = obs.changes;
                let count = c.significant();
                if count < self.threshold.min_significant_changes {
                    return None;
                }
                let severity = if count >= self.threshold.critical_changes {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                Some(Alert {
                    source: r.name.clone(),
                    severity,
                    reason: format!(
                        "{count} significant changes (website {}, news {}, jobs {})",
                        c.website_updates, c.news_articles, c.job_postings
                    ),
                    change_count: count,
                })
            })
            .collect();
        AlertSet { alerts }
    }
}
