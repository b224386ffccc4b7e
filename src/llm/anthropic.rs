// ABOUTME: Anthropic Messages API provider with native tool use
// ABOUTME: Default language model backend for SQL generation and forced chart tool calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # Anthropic Provider
//!
//! Talks to `POST /v1/messages`. System messages are lifted into the
//! top-level `system` field; tools are sent with their JSON Schema as
//! `input_schema`, and `tool_use` content blocks come back as
//! [`FunctionCall`]s.
//!
//! ## Configuration
//!
//! - `ANTHROPIC_API_KEY` (or the legacy `CLAUDE_API_KEY`): required
//! - `VIZQUERY_LLM_MODEL`: optional model override

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatResponseWithTools, FunctionCall, LlmCapabilities,
    LlmProvider, MessageRole, TokenUsage, Tool, ToolChoice,
};
use crate::errors::{AppError, ErrorCode};

/// Default API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// `max_tokens` is mandatory for this API
const DEFAULT_MAX_TOKENS: u32 = 4096;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 120;

const SERVICE_NAME: &str = "Anthropic";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(usage: ApiUsage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens + usage.output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the Anthropic provider
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Base URL, overridable for proxies and tests
    pub base_url: String,
    /// Model used when the request names none
    pub default_model: String,
    /// `max_tokens` used when the request names none
    pub default_max_tokens: u32,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl AnthropicConfig {
    /// Configuration with default endpoint and model
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_model: DEFAULT_MODEL.to_owned(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create a provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns a config error if the API key is empty, or an internal error
    /// if the HTTP client cannot be created
    pub fn new(config: AnthropicConfig) -> Result<Self, AppError> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::config("Anthropic API key must not be empty"));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Split out system messages; the API takes them as one top-level field
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<ApiMessage>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let converted = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect();
        let system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };
        (system, converted)
    }

    fn convert_tools(tools: &[Tool]) -> Vec<ApiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| ApiTool {
                    name: func.name.clone(),
                    description: func.description.clone(),
                    input_schema: func
                        .parameters
                        .clone()
                        .unwrap_or_else(|| serde_json::json!({"type": "object"})),
                })
            })
            .collect()
    }

    fn convert_tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Auto => serde_json::json!({"type": "auto"}),
            ToolChoice::Function(name) => serde_json::json!({"type": "tool", "name": name}),
        }
    }

    fn build_request(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
        tool_choice: Option<&ToolChoice>,
    ) -> MessagesRequest {
        let (system, messages) = Self::convert_messages(&request.messages);
        let tools = Self::convert_tools(tools);
        let tool_choice = if tools.is_empty() {
            None
        } else {
            tool_choice.map(Self::convert_tool_choice)
        };
        MessagesRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
            system,
            messages,
            temperature: request.temperature,
            tools,
            tool_choice,
        }
    }

    async fn send(&self, body: &MessagesRequest) -> Result<MessagesResponse, AppError> {
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending Anthropic messages request"
        );

        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Anthropic: {}", e);
                AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse Anthropic response: {}", e);
            AppError::external_service(SERVICE_NAME, format!("Failed to parse response: {e}"))
        })
    }

    /// Parse error response from API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<ErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |parsed| format!("{} - {}", parsed.error.error_type, parsed.error.message),
        );
        match status.as_u16() {
            401 | 403 => AppError::config(format!("Anthropic authentication failed: {detail}")),
            429 | 529 => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("Anthropic is rate limiting requests: {detail}"),
            ),
            400 => AppError::invalid_input(format!("Anthropic rejected the request: {detail}")),
            _ => AppError::external_service(SERVICE_NAME, format!("API error ({status}): {detail}")),
        }
    }

    fn split_content(blocks: Vec<ContentBlock>) -> (Option<String>, Vec<FunctionCall>) {
        let mut text = String::new();
        let mut calls = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text: t } => text.push_str(&t),
                ContentBlock::ToolUse { id, name, input } => {
                    debug!(tool_use_id = %id, function_name = %name, "Model requested tool");
                    calls.push(FunctionCall { name, args: input });
                }
                ContentBlock::Other => {}
            }
        }
        let text = if text.is_empty() { None } else { Some(text) };
        (text, calls)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic Claude"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::tool_calling()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let body = self.build_request(request, &[], None);
        let response = self.send(&body).await?;
        let (content, _) = Self::split_content(response.content);
        Ok(ChatResponse {
            content: content.unwrap_or_default(),
            model: response.model,
            usage: response.usage.map(TokenUsage::from),
            finish_reason: response.stop_reason,
        })
    }

    #[instrument(skip(self, request, tools), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
        tool_choice: ToolChoice,
    ) -> Result<ChatResponseWithTools, AppError> {
        let body = self.build_request(request, tools, Some(&tool_choice));
        let response = self.send(&body).await?;
        let (content, calls) = Self::split_content(response.content);
        Ok(ChatResponseWithTools {
            content,
            function_calls: if calls.is_empty() { None } else { Some(calls) },
            model: response.model,
            usage: response.usage.map(TokenUsage::from),
            finish_reason: response.stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::FunctionDeclaration;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(AnthropicProvider::new(AnthropicConfig::new("  ")).is_err());
    }

    #[test]
    fn test_system_messages_are_lifted() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hi"),
        ]);
        let body = provider().build_request(&request, &[], None);
        assert_eq!(body.system.as_deref(), Some("be terse"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_forced_tool_choice_serialization() {
        let tools = vec![Tool {
            function_declarations: vec![FunctionDeclaration {
                name: "generate_graph_data".to_owned(),
                description: "d".to_owned(),
                parameters: Some(json!({"type": "object"})),
            }],
        }];
        let request = ChatRequest::new(vec![ChatMessage::user("x")]);
        let body = provider().build_request(
            &request,
            &tools,
            Some(&ToolChoice::Function("generate_graph_data".to_owned())),
        );
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["tool_choice"],
            json!({"type": "tool", "name": "generate_graph_data"})
        );
        assert_eq!(value["tools"][0]["input_schema"], json!({"type": "object"}));
    }

    #[test]
    fn test_tool_use_blocks_become_function_calls() {
        let parsed: MessagesResponse = serde_json::from_value(json!({
            "model": "claude",
            "content": [
                {"type": "text", "text": "ok"},
                {"type": "tool_use", "id": "t1", "name": "generate_graph_data", "input": {"a": 1}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 3, "output_tokens": 4}
        }))
        .unwrap();
        let (text, calls) = AnthropicProvider::split_content(parsed.content);
        assert_eq!(text.as_deref(), Some("ok"));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, json!({"a": 1}));
    }

    #[test]
    fn test_error_mapping() {
        let err = AnthropicProvider::parse_error_response(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
        );
        assert!(err.is(ErrorCode::ExternalRateLimited));
    }
}
