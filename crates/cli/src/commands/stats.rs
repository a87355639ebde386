//! Stats command handler.
//!
//! Reports index size and the health of the knowledge client.

use crate::runtime;
use clap::Args;
use petpal_core::{config::AppConfig, AppResult};
use petpal_knowledge::ingest::IngestLedger;

/// Show knowledge index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = runtime::knowledge_client(config).await?;

        let entries = match client.count().await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(error = %e, "Could not count index entries");
                None
            }
        };

        let ledger_path = config.ledger_path();
        let ledger = if ledger_path.exists() {
            Some(IngestLedger::load(&ledger_path)?)
        } else {
            None
        };

        let health = client.health();
        let embedder = client.embedder();

        if self.json {
            let output = serde_json::json!({
                "backend": health.backend,
                "collection": config.index.collection,
                "degraded": health.degraded,
                "entries": entries,
                "embedder": embedder.provider_name(),
                "embeddingModel": embedder.model_name(),
                "ledgerEntries": ledger.as_ref().map(IngestLedger::len),
                "ledgerUpdatedAt": ledger.as_ref().and_then(IngestLedger::updated_at),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Backend:     {} ({})", health.backend, config.index.collection);
        println!("Status:      {}", if health.degraded { "degraded" } else { "ok" });
        match entries {
            Some(count) => println!("Entries:     {}", count),
            None => println!("Entries:     unavailable"),
        }
        println!(
            "Embeddings:  {} / {}",
            embedder.provider_name(),
            embedder.model_name()
        );
        if let Some(ledger) = &ledger {
            println!("Checkpoint:  {} documents recorded", ledger.len());
        }

        Ok(())
    }
}
