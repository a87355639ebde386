//! Batch ingestion controller.
//!
//! Pulls documents from the extractor and pushes them to the index in
//! fixed-size batches. Every batch is throttled: a short delay after success,
//! a longer back-off after failure. A failed batch is counted and skipped,
//! never retried within the same run.

use crate::client::KnowledgeClient;
use crate::extract::DocumentExtractor;
use crate::ingest::ledger::IngestLedger;
use crate::ingest::throttle::{Clock, RateLimiter, TokioClock};
use crate::progress::ProgressReporter;
use crate::types::Document;
use petpal_core::config::IngestionSettings;
use petpal_core::{AppError, AppResult};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Tunables for one controller.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub failure_backoff: Duration,
    pub requests_per_minute: Option<u32>,
    pub checkpoint: bool,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self::from(&IngestionSettings::default())
    }
}

impl From<&IngestionSettings> for IngestionOptions {
    fn from(settings: &IngestionSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            batch_delay: Duration::from_secs(settings.batch_delay_secs),
            failure_backoff: Duration::from_secs(settings.failure_backoff_secs),
            requests_per_minute: settings.requests_per_minute,
            checkpoint: settings.checkpoint,
        }
    }
}

impl IngestionOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn with_requests_per_minute(mut self, rpm: Option<u32>) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }
}

/// Outcome of one ingestion run. `attempted = succeeded + failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Blank documents, plus documents already in the ledger
    pub skipped: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub duration_secs: f64,
}

/// Proof that the caller holds the controller's run lock.
pub struct RunPermit {
    _guard: OwnedMutexGuard<()>,
}

pub struct IngestionController {
    extractor: DocumentExtractor,
    client: Arc<KnowledgeClient>,
    clock: Arc<dyn Clock>,
    options: IngestionOptions,
    limiter: Option<RateLimiter>,
    ledger_path: Option<PathBuf>,
    progress: ProgressReporter,
    run_lock: Arc<Mutex<()>>,
}

impl IngestionController {
    pub fn new(
        extractor: DocumentExtractor,
        client: Arc<KnowledgeClient>,
        options: IngestionOptions,
    ) -> Self {
        let limiter = options.requests_per_minute.map(RateLimiter::per_minute);
        Self {
            extractor,
            client,
            clock: Arc::new(TokioClock::new()),
            options,
            limiter,
            ledger_path: None,
            progress: ProgressReporter::noop(),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Where the checkpoint ledger lives; only used when checkpointing is on.
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Take the run lock without waiting. Fails with `AppError::Busy` while
    /// another run holds it.
    pub fn try_begin(&self) -> AppResult<RunPermit> {
        self.run_lock
            .clone()
            .try_lock_owned()
            .map(|guard| RunPermit { _guard: guard })
            .map_err(|_| AppError::Busy("an ingestion run is already in progress".to_string()))
    }

    /// Run one ingestion pass. `reset` clears the index first.
    pub async fn run_ingestion(&self, reset: bool) -> AppResult<IngestionSummary> {
        let permit = self.try_begin()?;
        self.run_with(permit, reset).await
    }

    /// Run one ingestion pass under an already acquired permit.
    pub async fn run_with(&self, _permit: RunPermit, reset: bool) -> AppResult<IngestionSummary> {
        let started = self.clock.now();
        tracing::info!(
            reset,
            batch_size = self.options.batch_size,
            checkpoint = self.options.checkpoint,
            "Starting ingestion run"
        );

        let mut ledger = self.load_ledger(reset)?;

        if reset {
            self.client.clear_all().await?;
            if let Some(ledger) = ledger.as_mut() {
                ledger.save()?;
            }
        }

        let extractor = self.extractor.clone();
        let documents = tokio::task::spawn_blocking(move || extractor.extract_documents())
            .await
            .map_err(|e| AppError::Other(format!("Extraction task failed: {}", e)))??;
        self.progress.extract(documents.len() as u64);

        let mut summary = IngestionSummary::default();
        let pending: Vec<Document> = documents
            .into_iter()
            .filter(|doc| {
                if doc.is_blank() {
                    tracing::warn!(source = ?doc.source(), "Skipping document with empty content");
                    summary.skipped += 1;
                    return false;
                }
                if ledger.as_ref().is_some_and(|l| l.contains(doc)) {
                    summary.skipped += 1;
                    return false;
                }
                true
            })
            .collect();

        if pending.is_empty() {
            tracing::info!(skipped = summary.skipped, "No documents to ingest");
            summary.duration_secs = self.elapsed_since(started);
            self.progress.done(0, 0);
            return Ok(summary);
        }

        if self.client.is_degraded() {
            return Err(AppError::IndexUnavailable(format!(
                "{} index is not connected; {} documents not ingested",
                self.client.backend(),
                pending.len()
            )));
        }

        let total = pending.len();
        let batches: Vec<&[Document]> = pending.chunks(self.options.batch_size).collect();
        let batch_count = batches.len();
        let mut handled = 0usize;

        for (i, batch) in batches.into_iter().enumerate() {
            let is_last = i + 1 == batch_count;

            if let Some(limiter) = &self.limiter {
                limiter.acquire(self.clock.as_ref()).await;
            }

            for (j, doc) in batch.iter().enumerate() {
                self.progress
                    .sending((handled + j + 1) as u64, total as u64, doc.content());
            }

            summary.batches += 1;
            handled += batch.len();

            match self.client.upsert(batch).await {
                Ok(_) => {
                    summary.succeeded += batch.len();
                    self.progress
                        .processed(handled as u64, total as u64, true, "OK");

                    if let Some(ledger) = ledger.as_mut() {
                        batch.iter().for_each(|doc| ledger.record(doc));
                        if let Err(e) = ledger.save() {
                            tracing::warn!(error = %e, "Failed to save ingest ledger");
                        }
                    }

                    if !is_last {
                        self.pause(self.options.batch_delay).await;
                    }
                }
                Err(e) => {
                    summary.failed += batch.len();
                    summary.failed_batches += 1;
                    tracing::warn!(
                        batch = i + 1,
                        of = batch_count,
                        documents = batch.len(),
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "Batch failed, backing off"
                    );
                    self.progress
                        .processed(handled as u64, total as u64, false, &e.to_string());

                    if !is_last {
                        self.progress.backoff(
                            handled as u64,
                            total as u64,
                            self.options.failure_backoff.as_secs(),
                        );
                        self.pause(self.options.failure_backoff).await;
                    }
                }
            }
        }

        summary.attempted = summary.succeeded + summary.failed;
        summary.duration_secs = self.elapsed_since(started);
        self.progress
            .done(summary.succeeded as u64, summary.attempted as u64);

        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Ingestion run completed in {:.2}s",
            summary.duration_secs
        );

        Ok(summary)
    }

    /// A reset starts from an empty ledger, so an unreadable file cannot
    /// block it.
    fn load_ledger(&self, reset: bool) -> AppResult<Option<IngestLedger>> {
        match (&self.ledger_path, self.options.checkpoint) {
            (Some(path), true) if reset => Ok(Some(IngestLedger::empty(path))),
            (Some(path), true) => IngestLedger::load(path).map(Some),
            (None, true) => {
                tracing::warn!("Checkpointing requested without a ledger path, ignoring");
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration).await;
        }
    }

    fn elapsed_since(&self, started: Duration) -> f64 {
        self.clock.now().saturating_sub(started).as_secs_f64()
    }
}
