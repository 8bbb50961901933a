// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alert::AlertThreshold;
use crate::fetch::retry::RetryPolicy;
use crate::fetch::FetchOptions;
use crate::pipeline::{PipelineSettings, DEFAULT_REPORT_KIND, DEFAULT_RESULTS_KIND};
use crate::report::{ReportSettings, DEFAULT_REPORT_PREFIX, MAX_REVIEW_INTERVAL_DAYS};

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

fn default_report_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_string()
}
fn default_report_kind() -> String {
    DEFAULT_REPORT_KIND.to_string()
}
fn default_results_kind() -> String {
    DEFAULT_RESULTS_KIND.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}
fn default_inputs_path() -> PathBuf {
    PathBuf::from("config/inputs.json")
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_review_interval_days() -> u32 {
    7
}

/// Runtime settings for one monitoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,
    #[serde(default = "default_report_kind")]
    pub report_kind: String,
    #[serde(default = "default_results_kind")]
    pub results_kind: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Registry file; `None` uses the registry lookup chain.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    #[serde(default = "default_inputs_path")]
    pub inputs_path: PathBuf,
    /// Canned observations. When set, no network requests are made.
    #[serde(default)]
    pub observations_path: Option<PathBuf>,
    /// Per-request timeout for the HTTP fetcher.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Bound on the whole fetch stage; absent means wait for every source.
    #[serde(default)]
    pub global_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub alerts: AlertThreshold,
    #[serde(default = "default_review_interval_days")]
    pub review_interval_days: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_prefix: default_report_prefix(),
            report_kind: default_report_kind(),
            results_kind: default_results_kind(),
            output_dir: default_output_dir(),
            registry_path: None,
            inputs_path: default_inputs_path(),
            observations_path: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            global_timeout_secs: None,
            retry: RetryPolicy::default(),
            alerts: AlertThreshold::default(),
            review_interval_days: default_review_interval_days(),
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parsing monitor config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading monitor config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $MONITOR_CONFIG_PATH
    /// 2) config/monitor.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.report_prefix.trim().is_empty() {
            return Err(anyhow!("report_prefix must not be empty"));
        }
        for (key, kind) in [
            ("report_kind", &self.report_kind),
            ("results_kind", &self.results_kind),
        ] {
            if kind.trim().is_empty() || kind.contains(['/', '\\']) {
                return Err(anyhow!("{key} must be a plain, non-empty name"));
            }
        }
        if self.report_kind == self.results_kind {
            return Err(anyhow!("report_kind and results_kind must differ"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(anyhow!("fetch_timeout_secs must be positive"));
        }
        if self.global_timeout_secs == Some(0) {
            return Err(anyhow!(
                "global_timeout_secs must be positive; omit it to wait for every source"
            ));
        }
        if !(1..=MAX_REVIEW_INTERVAL_DAYS).contains(&self.review_interval_days) {
            return Err(anyhow!(
                "review_interval_days must be within 1..={MAX_REVIEW_INTERVAL_DAYS}"
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            fetch: FetchOptions {
                global_timeout: self.global_timeout_secs.map(Duration::from_secs),
            },
            alerts: self.alerts,
            report: ReportSettings {
                prefix: self.report_prefix.clone(),
                review_interval_days: self.review_interval_days,
            },
            report_kind: self.report_kind.clone(),
            results_kind: self.results_kind.clone(),
        }
    }
}
