// src/observe.rs
//! Pipeline events. The core emits [`PipelineEvent`]s to an observer instead
//! of writing to the console; [`LoggingObserver`] turns them into tracing
//! records and `metrics` series.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::Mutex;

use crate::alert::Alert;
use crate::error::{PersistenceError, ValidationError};
use crate::fetch::types::{FetchResult, FetchSummary};

/// One-time metrics registration (so series show up in the exposition).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "monitor_fetch_success_total",
            "Sources observed successfully."
        );
        describe_counter!("monitor_fetch_error_total", "Sources whose fetch failed.");
        describe_histogram!("monitor_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_counter!("monitor_alerts_total", "Escalation alerts raised.");
        describe_counter!(
            "monitor_store_errors_total",
            "Artifact writes rejected by the store."
        );
        describe_gauge!("monitor_last_run_ts", "Unix ts when a report was last produced.");
        describe_gauge!("monitor_registry_sources", "Sources in the registry for this run.");
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    RunStarted { sources: usize },
    SourceFetched(FetchResult),
    FetchCompleted(FetchSummary),
    AggregationFailed(ValidationError),
    AlertRaised(Alert),
    ReportBuilt { report_id: String, generated_ts: i64 },
    ArtifactStored { name: String, bytes: usize },
    ArtifactFailed(PersistenceError),
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Default observer: structured logs + counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl PipelineObserver for LoggingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        ensure_metrics_described();
        match event {
            PipelineEvent::RunStarted { sources } => {
                tracing::info!(target: "monitor", sources, "monitoring run started");
            }
            PipelineEvent::SourceFetched(r) if r.is_success() => {
                counter!("monitor_fetch_success_total").increment(1);
                tracing::debug!(target: "monitor", source = %r.name, "source observed");
            }
            PipelineEvent::SourceFetched(r) => {
                counter!("monitor_fetch_error_total").increment(1);
                tracing::debug!(
                    target: "monitor",
                    source = %r.name,
                    error = r.error.as_deref().unwrap_or_default(),
                    "source failed"
                );
            }
            PipelineEvent::FetchCompleted(s) => {
                tracing::info!(
                    target: "monitor",
                    total = s.total,
                    succeeded = s.succeeded,
                    failed = s.failed,
                    "monitoring summary"
                );
            }
            PipelineEvent::AggregationFailed(e) => {
                tracing::error!(target: "monitor", field = e.field(), error = %e, "aggregation failed");
            }
            PipelineEvent::AlertRaised(a) => {
                counter!("monitor_alerts_total").increment(1);
                tracing::warn!(
                    target: "monitor",
                    source = %a.source,
                    severity = ?a.severity,
                    changes = a.change_count,
                    "escalation: {}",
                    a.reason
                );
            }
            PipelineEvent::ReportBuilt {
                report_id,
                generated_ts,
            } => {
                gauge!("monitor_last_run_ts").set(*generated_ts as f64);
                tracing::info!(target: "monitor", report_id = %report_id, "report built");
            }
            PipelineEvent::ArtifactStored { name, bytes } => {
                tracing::info!(target: "monitor", name = %name, bytes, "artifact stored");
            }
            PipelineEvent::ArtifactFailed(e) => {
                counter!("monitor_store_errors_total").increment(1);
                tracing::warn!(target: "monitor", name = %e.name, error = %e.reason, "artifact store failed");
            }
        }
    }
}

/// Keeps every event in memory. Handy in tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut v) = self.events.lock() {
            v.push(event.clone());
        }
    }
}
