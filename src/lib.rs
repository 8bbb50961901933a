// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod alert;
pub mod clock;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetch;
pub mod insights;
pub mod observe;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod store;

// ---- Re-exports for a stable public API ----
pub use crate::aggregate::{aggregate, AggregatorInputs, MetricSnapshot};
pub use crate::alert::{Alert, AlertEvaluator, AlertSet, AlertThreshold, Severity};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::MonitorConfig;
pub use crate::error::{FetchError, PersistenceError, PipelineError, ValidationError};
pub use crate::fetch::types::{FetchResult, FetchStatus, FetchSummary, Observation, SourceFetcher};
pub use crate::fetch::{fetch_all, FetchOptions};
pub use crate::pipeline::{Pipeline, PipelineSettings, RunOutcome};
pub use crate::registry::{MonitoredSource, Priority, SourceRegistry};
pub use crate::report::{Report, ReportBuilder, ReportSettings};
pub use crate::store::{ArtifactStore, LocalDirStore, MemoryStore};
