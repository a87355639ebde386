//! Serve command handler.

use crate::runtime;
use clap::Args;
use petpal_core::{config::AppConfig, AppResult};
use petpal_knowledge::{IngestionOptions, ProgressReporter};
use petpal_server::AppState;
use std::sync::Arc;

/// Run the chat HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides server.bind)
    #[arg(long, env = "PETPAL_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = runtime::knowledge_client(config).await?;
        let chat = runtime::chat_service(config, client.clone())?;
        let ingestion = runtime::ingestion_controller(
            config,
            client,
            IngestionOptions::from(&config.ingestion),
            ProgressReporter::noop(),
        );

        let state = AppState::new(Arc::new(chat), Arc::new(ingestion), config.admin_token());
        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        petpal_server::serve(bind, state).await
    }
}
