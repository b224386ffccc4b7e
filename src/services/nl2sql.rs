// ABOUTME: Natural-language to SQL translation through the configured language model
// ABOUTME: Renders a deterministic prompt from schema context and returns the model text untouched
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::AppResult;
use crate::llm::prompts::sql_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

pub use crate::llm::prompts::SqlPromptStyle;

/// Completion budget for a single SQL statement
const SQL_MAX_TOKENS: u32 = 1024;

/// Translates questions into SQL
///
/// The model is treated as an untrusted black box: its answer is returned
/// as-is and never executed here.
pub struct Nl2SqlPipeline {
    llm: Arc<dyn LlmProvider>,
    style: SqlPromptStyle,
}

impl Nl2SqlPipeline {
    /// Create a pipeline using the default `SELECT *` template
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            style: SqlPromptStyle::default(),
        }
    }

    /// Switch prompt template
    #[must_use]
    pub const fn with_style(mut self, style: SqlPromptStyle) -> Self {
        self.style = style;
        self
    }

    /// Ask the model for SQL answering `question` over `schema_description`
    ///
    /// # Errors
    ///
    /// Returns whatever error the model provider reports
    #[instrument(skip_all, fields(provider = self.llm.name(), style = ?self.style))]
    pub async fn translate(&self, schema_description: &str, question: &str) -> AppResult<String> {
        let request = ChatRequest::new(vec![ChatMessage::user(sql_prompt(
            self.style,
            schema_description,
            question,
        ))])
        .with_max_tokens(SQL_MAX_TOKENS);

        let response = self.llm.complete(&request).await?;
        debug!(chars = response.content.len(), model = %response.model, "SQL generated");
        Ok(response.content)
    }
}
