// ABOUTME: Chart synthesis pipeline forcing the model to call the graph data tool
// ABOUTME: Validates the tool arguments into a typed ChartSpec of the requested kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::constants::tools::GENERATE_GRAPH_DATA;
use crate::errors::{AppError, AppResult};
use crate::gateway::Row;
use crate::llm::prompts::{chart_format_rules, chart_prompt, chart_tool, CHART_SYSTEM_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, ToolChoice};
use crate::models::{ChartKind, ChartSpec};

/// Completion budget for a chart payload
const CHART_MAX_TOKENS: u32 = 4096;

/// Shapes query results into chart payloads
pub struct ChartSynthesisPipeline {
    llm: Arc<dyn LlmProvider>,
}

impl ChartSynthesisPipeline {
    /// Create a pipeline over `llm`
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Ask the model to chart `data` as `chart_type`
    ///
    /// # Errors
    ///
    /// Returns a config error if the provider cannot call tools, a validation
    /// error if the model skips the tool or returns a payload that breaks the
    /// contract of `chart_type`, or the provider's own error
    #[instrument(skip_all, fields(provider = self.llm.name(), kind = %chart_type))]
    pub async fn synthesize(
        &self,
        question: &str,
        chart_type: ChartKind,
        format_rules: &str,
        data: &Value,
    ) -> AppResult<ChartSpec> {
        if !self.llm.capabilities().supports_function_calling() {
            return Err(AppError::config(format!(
                "{} does not support tool calling required for charts",
                self.llm.display_name()
            )));
        }

        let data = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::internal(format!("Failed to serialize chart data: {e}")))?;
        let request = ChatRequest::new(vec![
            ChatMessage::system(CHART_SYSTEM_PROMPT),
            ChatMessage::user(chart_prompt(question, chart_type, format_rules, &data)),
        ])
        .with_max_tokens(CHART_MAX_TOKENS);

        let response = self
            .llm
            .complete_with_tools(
                &request,
                &[chart_tool()],
                ToolChoice::Function(GENERATE_GRAPH_DATA.to_owned()),
            )
            .await?;

        let Some(call) = response.call_named(GENERATE_GRAPH_DATA) else {
            warn!(finish_reason = ?response.finish_reason, "Model did not call the chart tool");
            return Err(AppError::validation(format!(
                "Model did not call {GENERATE_GRAPH_DATA}"
            )));
        };

        let spec = ChartSpec::from_tool_arguments(&call.args)?;
        if spec.kind() != chart_type {
            return Err(AppError::validation(format!(
                "Requested a {chart_type} chart but the model returned a {} chart",
                spec.kind()
            )));
        }

        debug!(title = spec.title(), "Chart synthesized");
        Ok(spec)
    }

    /// [`Self::synthesize`] with the standard rules for `kind` and `rows` as data
    ///
    /// # Errors
    ///
    /// Same as [`Self::synthesize`]
    pub async fn synthesize_with_defaults(
        &self,
        question: &str,
        kind: ChartKind,
        rows: &[Row],
    ) -> AppResult<ChartSpec> {
        let data = Value::Array(rows.iter().cloned().map(Value::Object).collect());
        self.synthesize(question, kind, chart_format_rules(kind), &data)
            .await
    }
}
