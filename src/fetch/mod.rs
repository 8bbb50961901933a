// src/fetch/mod.rs
//! Fetch Orchestrator: one concurrent collection per registered source.
//!
//! Every task owns exactly one slot (its registry index) and hands it back
//! through the join; nothing else writes the result vector. A failing or
//! panicking source degrades to an ERROR result and never touches the others.

pub mod providers;
pub mod retry;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::histogram;
use tokio::task::{Id, JoinSet};

use crate::clock::Clock;
use crate::error::FetchError;
use crate::observe::ensure_metrics_described;
use crate::registry::SourceRegistry;
use types::{FetchResult, SourceFetcher};

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Upper bound on the whole join. `None` waits for every source.
    pub global_timeout: Option<Duration>,
}

/// Run the fetcher once per source and return one result per source, in
/// registry order.
pub async fn fetch_all(
    registry: &SourceRegistry,
    fetcher: Arc<dyn SourceFetcher>,
    clock: Arc<dyn Clock>,
    options: &FetchOptions,
) -> Vec<FetchResult> {
    ensure_metrics_described();

    let sources = registry.sources();
    let mut slots: Vec<Option<FetchResult>> = vec![None; sources.len()];
    let mut tasks = JoinSet::new();
    let mut slot_of: HashMap<Id, usize> = HashMap::with_capacity(sources.len());

    for (slot, source) in sources.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let clock = Arc::clone(&clock);
        let handle = tasks.spawn(async move {
            let t0 = Instant::now();
            let outcome = fetcher.fetch(&source).await;
            histogram!("monitor_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            let result = match outcome {
                Ok(observation) => FetchResult::success(&source, observation, clock.now()),
                Err(e) => {
                    let err = FetchError::Failed {
                        source_name: source.name.clone(),
                        detail: format!("{e:#}"),
                    };
                    tracing::warn!(
                        target: "monitor",
                        source = %source.name,
                        fetcher = fetcher.name(),
                        error = %err,
                        "source fetch failed"
                    );
                    FetchResult::failure(&source, &err, clock.now())
                }
            };
            (slot, result)
        });
        slot_of.insert(handle.id(), slot);
    }

    // A dead task settles its slot as soon as it is joined, so a later
    // timeout cannot relabel it.
    let join = async {
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (slot, result))) => slots[slot] = Some(result),
                Err(e) => {
                    tracing::error!(target: "monitor", error = %e, "fetch task aborted");
                    if let Some(&slot) = slot_of.get(&e.id()) {
                        let source = &sources[slot];
                        let err = FetchError::TaskLost {
                            source_name: source.name.clone(),
                        };
                        slots[slot] = Some(FetchResult::failure(source, &err, clock.now()));
                    }
                }
            }
        }
    };

    let timed_out = match options.global_timeout {
        Some(limit) => tokio::time::timeout(limit, join).await.is_err(),
        None => {
            join.await;
            false
        }
    };
    if timed_out {
        tracing::warn!(
            target: "monitor",
            outstanding = slots.iter().filter(|s| s.is_none()).count(),
            "fetch join timed out"
        );
    }

    // Anything still unset outlived the timeout.
    let now = clock.now();
    sources
        .iter()
        .zip(slots)
        .map(|(source, slot)| {
            slot.unwrap_or_else(|| {
                let err = match options.global_timeout {
                    Some(after) if timed_out => FetchError::TimedOut { after },
                    _ => FetchError::TaskLost {
                        source_name: source.name.clone(),
                    },
                };
                FetchResult::failure(source, &err, now)
            })
        })
        .collect()
}
