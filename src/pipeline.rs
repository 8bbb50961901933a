//! # Pipeline
//! Registry → fetch → aggregate → alerts → report → store, one batch pass.
//!
//! Per-source failures are absorbed by the fetch stage; validation and
//! assembly failures abort the run before anything is written; store
//! failures become warnings on an otherwise successful outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::{aggregate, AggregatorInputs};
use crate::alert::{AlertEvaluator, AlertThreshold};
use crate::clock::{Clock, SystemClock};
use crate::error::{PersistenceError, PipelineError};
use crate::fetch::types::{FetchResult, FetchSummary, SourceFetcher};
use crate::fetch::{fetch_all, FetchOptions};
use crate::insights::{InsightProvider, StaticInsights};
use crate::observe::{LoggingObserver, PipelineEvent, PipelineObserver};
use crate::registry::SourceRegistry;
use crate::report::{Report, ReportBuilder, ReportSettings};
use crate::store::{artifact_name, ArtifactStore};

pub const DEFAULT_REPORT_KIND: &str = "analytics-report";
pub const DEFAULT_RESULTS_KIND: &str = "monitoring-results";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub fetch: FetchOptions,
    pub alerts: AlertThreshold,
    pub report: ReportSettings,
    pub report_kind: String,
    pub results_kind: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            alerts: AlertThreshold::default(),
            report: ReportSettings::default(),
            report_kind: DEFAULT_REPORT_KIND.to_string(),
            results_kind: DEFAULT_RESULTS_KIND.to_string(),
        }
    }
}

/// Raw fetch outcomes as written to the monitoring-results artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResults {
    pub timestamp: DateTime<Utc>,
    pub summary: FetchSummary,
    pub competitors: Vec<FetchResult>,
}

/// A produced report plus everything the caller needs to narrate the run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub results: Vec<FetchResult>,
    pub summary: FetchSummary,
    /// Store failures. The report is valid regardless.
    pub warnings: Vec<PersistenceError>,
}

impl RunOutcome {
    /// A produced report always exits 0, store failures included.
    pub fn exit_code(&self) -> u8 {
        0
    }

    pub fn alerting_sources(&self) -> Vec<&str> {
        self.report.alerts().sources()
    }
}

pub struct Pipeline {
    registry: SourceRegistry,
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn PipelineObserver>,
    insights: Arc<dyn InsightProvider>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(LoggingObserver),
            insights: Arc::new(StaticInsights),
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_insights(mut self, insights: Arc<dyn InsightProvider>) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn run(&self, inputs: &AggregatorInputs) -> Result<RunOutcome, PipelineError> {
        let emit = |e: PipelineEvent| self.observer.on_event(&e);

        emit(PipelineEvent::RunStarted {
            sources: self.registry.len(),
        });

        let results = fetch_all(
            &self.registry,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.clock),
            &self.settings.fetch,
        )
        .await;
        for r in &results {
            emit(PipelineEvent::SourceFetched(r.clone()));
        }
        let summary = FetchSummary::from_results(&results);
        emit(PipelineEvent::FetchCompleted(summary));

        let now = self.clock.now();
        let snapshot = aggregate(&results, inputs, now.date_naive()).map_err(|e| {
            emit(PipelineEvent::AggregationFailed(e.clone()));
            PipelineError::Validation(e)
        })?;

        let alerts = AlertEvaluator::new(self.settings.alerts).evaluate(&results);
        for a in &alerts.alerts {
            emit(PipelineEvent::AlertRaised(a.clone()));
        }

        let report = ReportBuilder::new(&self.settings.report, now)
            .with_monitoring(summary)
            .with_snapshot(snapshot)
            .with_alerts(alerts)
            .with_insights(self.insights.as_ref())
            .build()?;

        // Serialize everything up front: a failure here must leave no files.
        let report_bytes = report
            .to_json_pretty()
            .map_err(|e| PipelineError::Fatal(anyhow::Error::new(e).context("serializing report")))?;
        let results_doc = MonitoringResults {
            timestamp: now,
            summary,
            competitors: results.clone(),
        };
        let results_bytes = serde_json::to_vec_pretty(&results_doc).map_err(|e| {
            PipelineError::Fatal(anyhow::Error::new(e).context("serializing monitoring results"))
        })?;

        emit(PipelineEvent::ReportBuilt {
            report_id: report.report_id.clone(),
            generated_ts: now.timestamp(),
        });

        let date = now.date_naive();
        let artifacts = [
            (artifact_name(&self.settings.report_kind, date), report_bytes),
            (artifact_name(&self.settings.results_kind, date), results_bytes),
        ];
        let mut warnings = Vec::new();
        for (name, bytes) in artifacts {
            match self.store.put(&name, &bytes).await {
                Ok(()) => emit(PipelineEvent::ArtifactStored {
                    name,
                    bytes: bytes.len(),
                }),
                Err(e) => {
                    emit(PipelineEvent::ArtifactFailed(e.clone()));
                    warnings.push(e);
                }
            }
        }

        Ok(RunOutcome {
            report,
            results,
            summary,
            warnings,
        })
    }
}
