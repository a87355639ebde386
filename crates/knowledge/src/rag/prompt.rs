//! Grounded prompt composition.

use crate::types::Document;
use handlebars::Handlebars;
use petpal_core::{AppError, AppResult};
use serde::Serialize;

/// Heading of the reference section; present only when context was found.
pub const REFERENCE_HEADER: &str = "ข้อมูลอ้างอิงจากระบบ:";

const TEMPLATE_NAME: &str = "chat";

const DEFAULT_TEMPLATE: &str = "คุณคือ 'Petpal AI' ผู้ช่วยอัจฉริยะประจำเว็บไซต์ Petpal\n\
{{#if context}}\n\
{{header}}\n\
{{context}}\n\
{{/if}}\n\
คำถามจากผู้ใช้: {{query}}\n\
\n\
ตอบคำถามอย่างเป็นมิตรและสุภาพ:\n";

#[derive(Serialize)]
struct PromptVars<'a> {
    header: &'a str,
    context: String,
    query: &'a str,
}

/// Renders the persona preamble, optional reference section and the
/// verbatim user query into one prompt.
pub struct PromptComposer {
    registry: Handlebars<'static>,
}

impl PromptComposer {
    pub fn new() -> AppResult<Self> {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Use a custom template. Available variables: `header`, `context`,
    /// `query`.
    pub fn with_template(template: &str) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text prompt, no HTML escaping
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AppError::Config(format!("Failed to register prompt template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Compose a prompt; retrieved documents are joined one per line.
    pub fn compose(&self, query: &str, context: &[Document]) -> AppResult<String> {
        let context = context
            .iter()
            .map(Document::content)
            .collect::<Vec<_>>()
            .join("\n");

        let vars = PromptVars {
            header: REFERENCE_HEADER,
            context,
            query,
        };

        self.registry
            .render(TEMPLATE_NAME, &vars)
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))
    }
}
