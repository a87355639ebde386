//! Structured progress reporting for ingestion runs.
//!
//! Provides observable, incremental feedback while documents are extracted,
//! sent to the index in throttled batches, and backed off after failures.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use unicode_segmentation::UnicodeSegmentation;

/// Number of graphemes shown when previewing a document.
pub const PREVIEW_GRAPHEMES: usize = 120;

/// First `max` graphemes of `text` with line breaks flattened; `...` marks a
/// truncation.
pub fn preview(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let mut out: String = graphemes
        .by_ref()
        .take(max)
        .map(|g| if g == "\n" || g == "\r\n" { " " } else { g })
        .collect();
    if graphemes.next().is_some() {
        out.push_str("...");
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Extract,
    Sending,
    Processed,
    Backoff,
    Done,
}

impl ProgressPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressPhase::Extract => "extract",
            ProgressPhase::Sending => "sending",
            ProgressPhase::Processed => "processed",
            ProgressPhase::Backoff => "backoff",
            ProgressPhase::Done => "done",
        }
    }
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress event emitted during an ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,

    /// Documents handled so far
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Preview text, batch outcome or other human-readable detail
    pub message: String,

    /// Set on `Processed` events
    pub ok: Option<bool>,

    /// Elapsed time since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: ProgressPhase,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        });

        Self {
            phase,
            current,
            total,
            percentage,
            message: message.into(),
            ok: None,
            elapsed_secs: None,
        }
    }

    pub fn with_ok(mut self, ok: bool) -> Self {
        self.ok = Some(ok);
        self
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// A reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            ok = ?event.ok,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn extract(&self, documents: u64) {
        self.emit(ProgressEvent::new(
            ProgressPhase::Extract,
            documents,
            None,
            format!("{} documents extracted", documents),
        ));
    }

    /// A document is about to be sent to the index.
    pub fn sending(&self, current: u64, total: u64, content: &str) {
        self.emit(ProgressEvent::new(
            ProgressPhase::Sending,
            current,
            Some(total),
            preview(content, PREVIEW_GRAPHEMES),
        ));
    }

    /// A batch finished; `current` counts documents handled so far.
    pub fn processed(&self, current: u64, total: u64, ok: bool, detail: &str) {
        self.emit(
            ProgressEvent::new(ProgressPhase::Processed, current, Some(total), detail)
                .with_ok(ok),
        );
    }

    pub fn backoff(&self, current: u64, total: u64, secs: u64) {
        self.emit(ProgressEvent::new(
            ProgressPhase::Backoff,
            current,
            Some(total),
            format!("waiting {}s before next batch", secs),
        ));
    }

    pub fn done(&self, succeeded: u64, total: u64) {
        self.emit(ProgressEvent::new(
            ProgressPhase::Done,
            succeeded,
            Some(total),
            "ingestion finished",
        ));
    }
}
