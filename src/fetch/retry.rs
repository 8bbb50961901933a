// src/fetch/retry.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{Observation, SourceFetcher};
use crate::registry::MonitoredSource;

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. 0 is treated as 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(30);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Wraps a fetcher and retries failed calls according to `policy`.
pub struct Retrying<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: SourceFetcher> Retrying<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: SourceFetcher> SourceFetcher for Retrying<F> {
    async fn fetch(&self, source: &MonitoredSource) -> Result<Observation> {
        let max = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.inner.fetch(source).await {
                Ok(obs) => return Ok(obs),
                Err(e) if attempt < max => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::debug!(
                        target: "monitor",
                        source = %source.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(anyhow!("{e:#} (gave up after {attempt} attempts)"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
