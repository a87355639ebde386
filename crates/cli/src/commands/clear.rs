//! Clear command handler.

use crate::runtime;
use clap::Args;
use petpal_core::{config::AppConfig, AppResult};

/// Remove every entry from the knowledge index
#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = runtime::knowledge_client(config).await?;
        client.clear_all().await?;

        // A stale ledger would make the next checkpointed run skip everything.
        let ledger = config.ledger_path();
        if ledger.exists() {
            std::fs::remove_file(&ledger)?;
            tracing::debug!("Removed ingest ledger {:?}", ledger);
        }

        println!("Knowledge cleared ({})", client.backend());
        Ok(())
    }
}
