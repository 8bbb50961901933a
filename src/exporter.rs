// src/exporter.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::observe::ensure_metrics_described;

/// Process-wide Prometheus recorder. A batch run has no scrape endpoint, so
/// the exposition is rendered once at the end and stored as an artifact.
pub struct MetricsExporter {
    pub handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Install the global recorder. Fails if another recorder is already set.
    pub fn install(registry_size: usize) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        ensure_metrics_described();
        gauge!("monitor_registry_sources").set(registry_size as f64);
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// `metrics-<YYYY-MM-DD>.prom`
pub fn exposition_name(date: NaiveDate) -> String {
    format!("metrics-{}.prom", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_is_dated() {
        let d = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        assert_eq!(exposition_name(d), "metrics-2025-09-06.prom");
    }
}
