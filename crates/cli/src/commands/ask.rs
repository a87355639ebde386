//! Ask command handler.

use crate::runtime;
use clap::Args;
use petpal_core::{config::AppConfig, AppError, AppResult};

/// Ask Petpal AI a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question, e.g. "หาบ้านให้แมวสีส้ม"
    pub message: String,

    /// Print the retrieved context and composed prompt as well
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput("message must not be empty".to_string()));
        }

        let client = runtime::knowledge_client(config).await?;
        let chat = runtime::chat_service(config, client)?;
        let exchange = chat.exchange(message).await;

        if self.json {
            let output = serde_json::json!({
                "response": exchange.answer,
                "context": exchange
                    .retrieved_context
                    .iter()
                    .map(|d| d.content())
                    .collect::<Vec<_>>(),
                "states": exchange.states,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if self.show_context {
            println!("--- Retrieved {} documents ---", exchange.retrieved_context.len());
            for doc in &exchange.retrieved_context {
                println!("* {}", doc.content());
            }
            println!("--- Prompt ---\n{}\n--- Answer ---", exchange.composed_prompt.trim());
        }
        println!("{}", exchange.answer);

        Ok(())
    }
}
