use crate::domain::model::{InputRecord, Outcome, ServiceError};
use crate::domain::ports::Enricher;
use crate::utils::monitor::{ProgressMonitor, ProgressSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Knobs for a batch run. Passed in explicitly, there is no global state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Upper bound on enrichment calls in flight at once.
    pub concurrency: usize,
    /// Per-attempt limit; a hung call resolves to `ServiceError::Timeout`.
    pub request_timeout: Option<Duration>,
    /// Extra attempts for transient failures. Zero disables retries.
    pub max_retries: u32,
    /// Base delay, doubled after every failed attempt.
    pub retry_backoff: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            request_timeout: Some(Duration::from_secs(120)),
            max_retries: 0,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl ExecutorConfig {
    fn backoff_for(&self, attempt: u32, error: &ServiceError) -> Duration {
        let exponential = self
            .retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF);
        match error.retry_after() {
            Some(hint) if hint > exponential => hint.min(MAX_BACKOFF),
            _ => exponential,
        }
    }
}

/// Runs an [`Enricher`] over every row with a fixed concurrency ceiling.
///
/// Each row gets its own task that owns a copy of the record. A semaphore
/// gates the calls, results are written into the slot matching the row's
/// index, so the returned outcomes line up with the input no matter which
/// task finishes first. One row failing, hanging past its timeout or even
/// panicking leaves every other row untouched.
pub struct BoundedExecutor<E: Enricher + 'static> {
    enricher: Arc<E>,
    config: ExecutorConfig,
    progress: Arc<ProgressMonitor>,
}

impl<E: Enricher + 'static> BoundedExecutor<E> {
    pub fn new(enricher: Arc<E>, config: ExecutorConfig) -> Self {
        Self {
            enricher,
            config,
            progress: Arc::new(ProgressMonitor::new()),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Shared handle on the progress counters, usable while a batch runs.
    pub fn progress(&self) -> Arc<ProgressMonitor> {
        Arc::clone(&self.progress)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    #[instrument(skip_all, fields(rows = records.len(), concurrency = self.config.concurrency))]
    pub async fn run_all(&self, records: &[InputRecord]) -> Vec<Outcome> {
        let total = records.len();
        self.progress.expect(total);
        info!(
            "🚀 Enriching {} rows ({} at a time, {} retries)",
            total, self.config.concurrency, self.config.max_retries
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut handles = Vec::with_capacity(total);

        for (index, record) in records.iter().enumerate() {
            let record = record.clone();
            let enricher = Arc::clone(&self.enricher);
            let config = self.config.clone();
            let sem = Arc::clone(&semaphore);
            let progress = Arc::clone(&self.progress);

            handles.push(tokio::spawn(async move {
                let outcome = match sem.acquire_owned().await {
                    Ok(_permit) => enrich_with_policy(enricher.as_ref(), &record, &config).await,
                    Err(_) => Outcome::Failure(ServiceError::Internal(
                        "worker pool closed".to_string(),
                    )),
                };

                log_row(index, total, &record, &outcome);
                let snapshot = progress.record(outcome.is_success());
                progress.log_progress(&snapshot);
                outcome
            }));
        }

        let mut slots: Vec<Option<Outcome>> = vec![None; total];
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(row = index + 1, error = %e, "worker task did not finish");
                    self.progress.record(false);
                    Outcome::Failure(ServiceError::Internal(e.to_string()))
                }
            };
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Outcome::Failure(ServiceError::Internal("row was never scheduled".to_string()))
                })
            })
            .collect()
    }
}

/// One row's full lifetime: attempt, time out, retry transient failures.
async fn enrich_with_policy<E: Enricher + ?Sized>(
    enricher: &E,
    record: &InputRecord,
    config: &ExecutorConfig,
) -> Outcome {
    let mut attempt = 0u32;
    loop {
        let outcome = match config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, enricher.enrich(record)).await {
                Ok(outcome) => outcome,
                Err(_) => Outcome::Failure(ServiceError::Timeout),
            },
            None => enricher.enrich(record).await,
        };

        match outcome {
            Outcome::Failure(error) if error.is_transient() && attempt < config.max_retries => {
                let delay = config.backoff_for(attempt, &error);
                attempt += 1;
                warn!(
                    company = %record.company_name,
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "⏳ transient failure ({}), retrying",
                    error
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

fn log_row(index: usize, total: usize, record: &InputRecord, outcome: &Outcome) {
    match outcome {
        Outcome::Success(result) if result.is_empty() => {
            info!(
                "[{}/{}] ⚠️  {} - no contact found",
                index + 1,
                total,
                record.company_name
            );
        }
        Outcome::Success(result) => {
            info!(
                "[{}/{}] ✅ {} - {} {} ({})",
                index + 1,
                total,
                record.company_name,
                result.contact_first_name.as_deref().unwrap_or("?"),
                result.contact_last_name.as_deref().unwrap_or(""),
                result.contact_title.as_deref().unwrap_or("no title")
            );
        }
        Outcome::Failure(error) => {
            warn!("[{}/{}] ❌ {} - {}", index + 1, total, record.company_name, error);
        }
    }
    debug!(row = index + 1, success = outcome.is_success(), "row settled");
}
