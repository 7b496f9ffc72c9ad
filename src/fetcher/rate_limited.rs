use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::config::FetcherSettings;
use crate::error::FetchError;
use crate::models::{Checkpoint, Metric, MetricSeries};

/// Executes one query per checkpoint with bounded parallelism and a fixed
/// submission cadence.
///
/// - At most `workers` queries are in flight at any time.
/// - Submissions are spaced `pacing` apart regardless of how fast queries
///   return, which caps the sustained request rate on the endpoint. The
///   spacing holds across consecutive batches and is shared by clones.
/// - Results are collected in submission order, so `values[i]` always belongs
///   to `checkpoints[i]` whatever the completion order.
/// - A single missing value fails the whole batch. No partial series is
///   returned and nothing is retried.
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher {
    workers: usize,
    pacing: Duration,
    /// Earliest instant the next submission may go out.
    next_slot: Arc<Mutex<Option<tokio::time::Instant>>>,
}

impl RateLimitedFetcher {
    pub fn new(settings: &FetcherSettings) -> Self {
        Self {
            workers: settings.workers.max(1),
            pacing: Duration::from_millis(settings.pacing_ms),
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Wait for the next submission slot and reserve the one after it.
    ///
    /// The lock is held while sleeping so concurrent callers queue up
    /// behind each other instead of sharing a slot.
    async fn wait_for_slot(&self) {
        if self.pacing.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot {
            tokio::time::sleep_until(at).await;
        }
        *next_slot = Some(tokio::time::Instant::now() + self.pacing);
    }

    /// Run `query` for every checkpoint and return the aligned series.
    ///
    /// `query` must swallow its own failures and answer `None`; it is never
    /// retried. The batch only fails after every submitted query has been
    /// collected.
    pub async fn fetch_all<T, F, Fut>(
        &self,
        chain: &str,
        metric: Metric,
        checkpoints: &[Checkpoint],
        query: F,
    ) -> Result<MetricSeries<T>, FetchError>
    where
        T: Send + 'static,
        F: Fn(&Checkpoint) -> Fut,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        if checkpoints.is_empty() {
            return Ok(MetricSeries::new(chain, metric, Vec::new()));
        }

        let start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.workers));

        let mut handles: Vec<JoinHandle<Option<T>>> = Vec::with_capacity(checkpoints.len());

        for checkpoint in checkpoints {
            self.wait_for_slot().await;

            let permits = permits.clone();
            let task = query(checkpoint);

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // if that invariant is broken; treat it as a missing value.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return None;
                };
                task.await
            }));
        }

        let total = handles.len();
        let mut values = Vec::with_capacity(total);
        let mut first_missing: Option<usize> = None;
        let mut missing = 0usize;
        let mut worker_failure: Option<FetchError> = None;

        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {
                    missing += 1;
                    first_missing.get_or_insert(index);
                },
                Err(e) => {
                    missing += 1;
                    first_missing.get_or_insert(index);
                    if worker_failure.is_none() {
                        worker_failure = Some(FetchError::Worker {
                            chain: chain.to_string(),
                            metric,
                            block_number: checkpoints[index].block_number,
                            source: e,
                        });
                    }
                },
            }
        }

        if let Some(e) = worker_failure {
            return Err(e);
        }

        if let Some(index) = first_missing {
            return Err(FetchError::Incomplete {
                chain: chain.to_string(),
                metric,
                index,
                block_number: checkpoints[index].block_number,
                missing,
                total,
            });
        }

        info!(
            "Fetched {} {} values on {} in {:?}",
            values.len(),
            metric,
            chain,
            start.elapsed()
        );

        Ok(MetricSeries::new(chain, metric, values))
    }
}
