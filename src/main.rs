//! Competitor Monitor: Binary Entrypoint
//! One batch run: load config, collect every source, aggregate, report, store.
//!
//! Exit code 0 when a report was produced (store failures are warnings),
//! 1 when the run aborted.

use std::process::ExitCode;
use std::sync::Arc;

use competitor_monitor::aggregate::AggregatorInputs;
use competitor_monitor::exporter::{exposition_name, MetricsExporter};
use competitor_monitor::fetch::providers::fixture::FixtureFetcher;
use competitor_monitor::fetch::providers::http::HttpFetcher;
use competitor_monitor::fetch::retry::Retrying;
use competitor_monitor::report::format_money;
use competitor_monitor::{
    ArtifactStore, LocalDirStore, MonitorConfig, Pipeline, PipelineError, RunOutcome,
    SourceFetcher, SourceRegistry,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_LOG_FORMAT: &str = "MONITOR_LOG_FORMAT";

/// Compact logs by default, JSON lines when `MONITOR_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("monitor=info,competitor_monitor=info,warn"));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(target: "monitor", error = %e, "monitoring run aborted");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<u8, PipelineError> {
    let config = MonitorConfig::load_default()?;
    let registry = match &config.registry_path {
        Some(p) => SourceRegistry::load_from(p)?,
        None => SourceRegistry::load_default()?,
    };
    let inputs = AggregatorInputs::load_from(&config.inputs_path)?;

    let exporter = match MetricsExporter::install(registry.len()) {
        Ok(exp) => Some(exp),
        Err(e) => {
            tracing::warn!(target: "monitor", error = %e, "metrics disabled");
            None
        }
    };

    let fetcher: Arc<dyn SourceFetcher> = match &config.observations_path {
        Some(p) => {
            tracing::info!(target: "monitor", path = %p.display(), "replaying canned observations");
            Arc::new(FixtureFetcher::from_path(p)?)
        }
        None => Arc::new(Retrying::new(
            HttpFetcher::new(config.fetch_timeout())?,
            config.retry,
        )),
    };
    let store = Arc::new(LocalDirStore::new(&config.output_dir));

    let pipeline = Pipeline::new(registry, fetcher, store.clone())
        .with_settings(config.pipeline_settings());
    let outcome = pipeline.run(&inputs).await?;
    log_summary(&outcome);

    if let Some(exp) = exporter {
        let name = exposition_name(outcome.report.generated_at.date_naive());
        if let Err(e) = store.put(&name, exp.render().as_bytes()).await {
            tracing::warn!(target: "monitor", error = %e, "metrics exposition not stored");
        }
    }

    Ok(outcome.exit_code())
}

fn log_summary(outcome: &RunOutcome) {
    let report = &outcome.report;
    let fin = &report.detailed_metrics.financial;

    tracing::info!(
        target: "monitor",
        report_id = %report.report_id,
        succeeded = outcome.summary.succeeded,
        failed = outcome.summary.failed,
        "monitoring complete"
    );
    let alerting = outcome.alerting_sources();
    if alerting.is_empty() {
        tracing::info!(target: "monitor", "no escalation required");
    } else {
        tracing::warn!(
            target: "monitor",
            sources = %alerting.join(", "),
            "escalation required"
        );
    }
    tracing::info!(
        target: "monitor",
        annual_projection = %format_money(fin.annual_profit_projection),
        roi_pct = fin.roi_percentage,
        break_even_months = ?fin.break_even_months.months(),
        next_review = %report.next_review_date,
        "financial outlook"
    );
    for w in &outcome.warnings {
        tracing::warn!(target: "monitor", error = %w, "report produced but not fully stored");
    }
}
