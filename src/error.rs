// src/error.rs
//! Error taxonomy of a monitoring run.
//!
//! Per-source failures never leave the fetch stage; they are folded into an
//! ERROR [`FetchResult`](crate::fetch::types::FetchResult). Validation and
//! assembly failures abort the run. Store failures are downgraded to warnings.

use std::time::Duration;

/// One source's collection failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("fetch failed for {source_name}: {detail}")]
    Failed { source_name: String, detail: String },

    #[error("fetch timed out after {}ms", .after.as_millis())]
    TimedOut { after: Duration },

    #[error("fetch task for {source_name} did not complete")]
    TaskLost { source_name: String },
}

/// A required business input is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required input: {field}")]
    Missing { field: String },

    #[error("malformed input {field}: {reason}")]
    Malformed { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Dotted path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field } | Self::Malformed { field, .. } => field,
        }
    }
}

/// The artifact store rejected a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to store {name}: {reason}")]
pub struct PersistenceError {
    pub name: String,
    pub reason: String,
}

impl PersistenceError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Failures that prevent a report from being produced.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("report is incomplete: {0} was never supplied")]
    Incomplete(&'static str),

    #[error("fatal pipeline error: {0:#}")]
    Fatal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
