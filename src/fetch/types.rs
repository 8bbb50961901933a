// src/fetch/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::registry::{MonitoredSource, Priority};

/// Content deltas observed since the source's previous crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounters {
    #[serde(default)]
    pub website_updates: u32,
    #[serde(default)]
    pub news_articles: u32,
    #[serde(default)]
    pub job_postings: u32,
}

impl ChangeCounters {
    pub fn significant(&self) -> u32 {
        self.website_updates
            .saturating_add(self.news_articles)
            .saturating_add(self.job_postings)
    }
}

/// Raw counters a fetcher reports for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub keyword_matches: u32,
    #[serde(default)]
    pub new_content: Vec<String>,
    #[serde(default)]
    pub changes: ChangeCounters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchStatus {
    Success,
    Error,
}

/// Outcome of one collection attempt. Exactly one per source per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub name: String,
    pub url: String,
    pub priority: Priority,
    pub status: FetchStatus,
    #[serde(rename = "last_updated")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
}

impl FetchResult {
    pub fn success(source: &MonitoredSource, observation: Observation, at: DateTime<Utc>) -> Self {
        Self {
            name: source.name.clone(),
            url: source.url.clone(),
            priority: source.priority,
            status: FetchStatus::Success,
            timestamp: at,
            error: None,
            observation: Some(observation),
        }
    }

    pub fn failure(source: &MonitoredSource, err: &FetchError, at: DateTime<Utc>) -> Self {
        Self {
            name: source.name.clone(),
            url: source.url.clone(),
            priority: source.priority,
            status: FetchStatus::Error,
            timestamp: at,
            error: Some(err.to_string()),
            observation: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// Succeeded/failed tally over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn from_results(results: &[FetchResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// Collaborator that observes one source. Transport is up to the implementor.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &MonitoredSource) -> Result<Observation>;
    fn name(&self) -> &'static str;
}
