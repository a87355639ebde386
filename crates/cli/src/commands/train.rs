//! Train command handler.
//!
//! Rebuilds or extends the index from the platform database, one throttled
//! batch at a time.

use crate::runtime;
use clap::Args;
use petpal_core::{config::AppConfig, AppResult};
use petpal_knowledge::{IngestionOptions, ProgressEvent, ProgressPhase, ProgressReporter};
use std::sync::Arc;
use std::time::Duration;

/// Ingest posts and foundations into the knowledge index
#[derive(Args, Debug)]
pub struct TrainCommand {
    /// Clear the index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Documents per request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seconds to wait after a successful batch
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Seconds to wait after a failed batch
    #[arg(long, value_name = "SECS")]
    pub backoff: Option<u64>,

    /// Skip documents recorded by a previous run
    #[arg(long)]
    pub checkpoint: bool,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl TrainCommand {
    fn options(&self, config: &AppConfig) -> IngestionOptions {
        let mut options = IngestionOptions::from(&config.ingestion);
        if let Some(batch_size) = self.batch_size {
            options = options.with_batch_size(batch_size);
        }
        if let Some(delay) = self.delay {
            options = options.with_batch_delay(Duration::from_secs(delay));
        }
        if let Some(backoff) = self.backoff {
            options = options.with_failure_backoff(Duration::from_secs(backoff));
        }
        if self.checkpoint {
            options = options.with_checkpoint(true);
        }
        options
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let options = self.options(config);
        tracing::debug!("Ingestion options: {:?}", options);

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            println!("Starting AI training...");
            ProgressReporter::new(Arc::new(print_progress))
        };

        let client = runtime::knowledge_client(config).await?;
        let controller = runtime::ingestion_controller(config, client, options, progress);
        let summary = controller.run_ingestion(self.reset).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else if summary.attempted == 0 && summary.skipped == 0 {
            println!("No documents found to train.");
        } else {
            println!(
                "Training finished! {} indexed, {} failed, {} skipped ({} batches) in {:.1}s",
                summary.succeeded,
                summary.failed,
                summary.skipped,
                summary.batches,
                summary.duration_secs
            );
        }

        Ok(())
    }
}

fn print_progress(event: ProgressEvent) {
    let total = event.total.unwrap_or(0);
    match event.phase {
        ProgressPhase::Extract if event.current > 0 => {
            println!("Found {} documents. Starting slow upload...", event.current);
        }
        ProgressPhase::Sending => println!("  -> Sending: \"{}\"", event.message),
        ProgressPhase::Processed if event.ok == Some(true) => {
            println!("   Processed {}/{}... OK", event.current, total);
        }
        ProgressPhase::Processed => {
            println!("   Error in item {}: {}", event.current, event.message);
        }
        ProgressPhase::Backoff => println!("   {}", event.message),
        _ => {}
    }
}
