use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::fetch::types::{Observation, SourceFetcher};
use crate::registry::MonitoredSource;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FixtureEntry {
    Failure { error: String },
    Observed(Observation),
}

/// Replays canned observations keyed by source name.
///
/// ```json
/// { "Acme": { "keyword_matches": 9, "changes": { "news_articles": 2 } },
///   "Beta": { "error": "HTTP 503" } }
/// ```
/// Sources without an entry fail.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    entries: HashMap<String, FixtureEntry>,
}

impl FixtureFetcher {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let entries = serde_json::from_str(s).context("parsing observation fixture")?;
        Ok(Self { entries })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading observation fixture {}", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn with_observation(mut self, name: impl Into<String>, obs: Observation) -> Self {
        self.entries.insert(name.into(), FixtureEntry::Observed(obs));
        self
    }

    pub fn with_failure(mut self, name: impl Into<String>, error: impl Into<String>) -> Self {
        self.entries.insert(
            name.into(),
            FixtureEntry::Failure {
                error: error.into(),
            },
        );
        self
    }
}

#[async_trait]
impl SourceFetcher for FixtureFetcher {
    async fn fetch(&self, source: &MonitoredSource) -> Result<Observation> {
        match self.entries.get(&source.name) {
            Some(FixtureEntry::Observed(obs)) => Ok(obs.clone()),
            Some(FixtureEntry::Failure { error }) => Err(anyhow!("{error}")),
            None => Err(anyhow!("no fixture for {}", source.name)),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Priority;

    fn src(name: &str) -> MonitoredSource {
        MonitoredSource::new(name, "https://x.test", ["news"], Priority::Low)
    }

    #[tokio::test]
    async fn replays_entries_and_failures() {
        let f = FixtureFetcher::from_json_str(
            r#"{
                "Acme": { "keyword_matches": 9, "changes": { "news_articles": 2 } },
                "Beta": { "error": "HTTP 503" }
            }"#,
        )
        .unwrap();

        let acme = f.fetch(&src("Acme")).await.unwrap();
        assert_eq!(acme.keyword_matches, 9);
        assert_eq!(acme.changes.news_articles, 2);
        assert_eq!(acme.changes.job_postings, 0);

        let beta = f.fetch(&src("Beta")).await.unwrap_err();
        assert_eq!(beta.to_string(), "HTTP 503");

        let missing = f.fetch(&src("Gamma")).await.unwrap_err();
        assert!(missing.to_string().contains("no fixture"));
    }
}
