// ABOUTME: Generic OpenAI-compatible LLM provider for local and hosted endpoints
// ABOUTME: Supports Ollama, vLLM, LocalAI, and any chat-completions API with tool calling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # `OpenAI`-Compatible Provider
//!
//! Generic implementation for any endpoint that speaks the `OpenAI` chat
//! completions API, so the pipelines can run against a local model server.
//!
//! ## Configuration
//!
//! - `LOCAL_LLM_BASE_URL`: Base URL (default: <http://localhost:11434/v1> for Ollama)
//! - `LOCAL_LLM_MODEL`: Model to use (default: `qwen2.5:14b-instruct`)
//! - `LOCAL_LLM_API_KEY`: API key (optional, empty for local servers)
//!
//! ## Supported Backends
//!
//! - **Ollama**: <http://localhost:11434/v1>
//! - **vLLM**: <http://localhost:8000/v1>
//! - **`LocalAI`**: <http://localhost:8080/v1>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatResponseWithTools, FunctionCall, LlmCapabilities,
    LlmProvider, TokenUsage, Tool, ToolChoice,
};
use crate::config::LlmConfig;
use crate::errors::{AppError, ErrorCode};

/// Connection timeout for local servers (more lenient than cloud)
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Request timeout (local inference can be slower)
const REQUEST_TIMEOUT_SECS: u64 = 300;

const SERVICE_NAME: &str = "LocalLLM";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for TokenUsage {
    fn from(u: OpenAiUsage) -> Self {
        Self {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <http://localhost:11434/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging
    pub provider_name: &'static str,
    /// Provider display name
    pub display_name: &'static str,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl std::fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("provider_name", &self.provider_name)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleConfig {
    /// Create configuration for a local Ollama instance
    #[must_use]
    pub fn ollama(model: &str) -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_owned(),
            api_key: None,
            default_model: model.to_owned(),
            provider_name: "ollama",
            display_name: "Ollama (Local)",
            capabilities: LlmCapabilities::tool_calling(),
        }
    }

    /// Create configuration for a local vLLM instance
    #[must_use]
    pub fn vllm(model: &str) -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_owned(),
            api_key: None,
            default_model: model.to_owned(),
            provider_name: "vllm",
            display_name: "vLLM (Local)",
            capabilities: LlmCapabilities::tool_calling() | LlmCapabilities::JSON_MODE,
        }
    }

    /// Create configuration for `LocalAI`
    #[must_use]
    pub fn local_ai(model: &str) -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_owned(),
            api_key: None,
            default_model: model.to_owned(),
            provider_name: "localai",
            display_name: "LocalAI",
            capabilities: LlmCapabilities::tool_calling(),
        }
    }

    /// Build from runtime configuration, picking a preset by the port in the URL
    #[must_use]
    pub fn from_llm_config(llm: &LlmConfig) -> Self {
        let model = llm.model.as_deref().unwrap_or(&llm.local_model);
        let preset = if llm.local_base_url.contains(":11434") {
            Self::ollama(model)
        } else if llm.local_base_url.contains(":8000") {
            Self::vllm(model)
        } else if llm.local_base_url.contains(":8080") {
            Self::local_ai(model)
        } else {
            Self {
                provider_name: "local",
                display_name: "Local LLM",
                ..Self::ollama(model)
            }
        };
        Self {
            base_url: llm.local_base_url.clone(),
            api_key: llm.local_api_key.clone(),
            ..preset
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "Initializing {} provider: base_url={}, model={}",
            config.display_name, config.base_url, config.default_model
        );
        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<OpenAiMessage> {
        messages.iter().map(OpenAiMessage::from).collect()
    }

    fn convert_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| OpenAiTool {
                    tool_type: "function",
                    function: OpenAiFunction {
                        name: func.name.clone(),
                        description: func.description.clone(),
                        parameters: func.parameters.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::Function(name) => json!({"type": "function", "function": {"name": name}}),
        }
    }

    /// Arguments arrive as a JSON string; unparseable arguments become `null`
    /// so chart validation reports them
    fn convert_tool_calls(tool_calls: &[OpenAiToolCall]) -> Vec<FunctionCall> {
        tool_calls
            .iter()
            .map(|call| {
                debug!(
                    tool_call_id = %call.id,
                    function_name = %call.function.name,
                    "Converting tool call to FunctionCall"
                );
                let args = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                    warn!("Tool call arguments are not valid JSON: {}", e);
                    Value::Null
                });
                FunctionCall {
                    name: call.function.name.clone(),
                    args,
                }
            })
            .collect()
    }

    fn build_request(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
        tool_choice: Option<&ToolChoice>,
    ) -> OpenAiRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let has_tools = !tools.is_empty();
        OpenAiRequest {
            model,
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
            tools: has_tools.then(|| Self::convert_tools(tools)),
            tool_choice: tool_choice
                .filter(|_| has_tools)
                .map(Self::convert_tool_choice),
        }
    }

    /// Parse error response from API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let message = error_response.error.message;
            match status.as_u16() {
                401 | 403 => AppError::config(format!("API authentication failed: {message}")),
                429 => AppError::new(
                    ErrorCode::ExternalRateLimited,
                    format!("LLM rate limit reached: {message}"),
                ),
                400 => AppError::invalid_input(format!("API validation error: {message}")),
                404 => AppError::external_service(
                    SERVICE_NAME,
                    format!("Model or endpoint not found: {message}"),
                ),
                _ => AppError::external_service(
                    SERVICE_NAME,
                    format!(
                        "{} - {message}",
                        error_response
                            .error
                            .error_type
                            .as_deref()
                            .unwrap_or("unknown")
                    ),
                ),
            }
        } else {
            // Local servers often answer with plain text
            match status.as_u16() {
                502..=504 => AppError::external_service(
                    SERVICE_NAME,
                    "Local LLM server is not responding. Is Ollama/vLLM running?",
                ),
                _ => AppError::external_service(
                    SERVICE_NAME,
                    format!(
                        "API error ({}): {}",
                        status,
                        body.chars().take(200).collect::<String>()
                    ),
                ),
            }
        }
    }

    async fn send(&self, body: &OpenAiRequest) -> Result<OpenAiResponse, AppError> {
        debug!(
            "Sending chat completion request to {} with {} messages, tools={}",
            self.config.provider_name,
            body.messages.len(),
            body.tools.as_ref().map_or(0, Vec::len)
        );

        let mut http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(ref api_key) = self.config.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = http_request.send().await.map_err(|e| {
            error!(
                "Failed to send request to {}: {}",
                self.config.provider_name, e
            );
            if e.is_connect() {
                AppError::external_service(
                    SERVICE_NAME,
                    format!(
                        "Cannot connect to {}. Is the server running at {}?",
                        self.config.display_name, self.config.base_url
                    ),
                )
            } else {
                AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse API response: {}", e);
            AppError::external_service(SERVICE_NAME, format!("Failed to parse response: {e}"))
        })
    }

    fn first_choice(
        response: OpenAiResponse,
    ) -> Result<(String, Option<TokenUsage>, OpenAiChoice), AppError> {
        let usage = response.usage.map(TokenUsage::from);
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "API returned no choices"))?;
        Ok((response.model, usage, choice))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let body = self.build_request(request, &[], None);
        let (model, usage, choice) = Self::first_choice(self.send(&body).await?)?;
        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from {}: {} chars, finish_reason: {:?}",
            self.config.provider_name,
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model,
            usage,
            finish_reason: choice.finish_reason,
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
        let (model, usage, choice) = Self::first_choice(self.send(&body).await?)?;
        let function_calls = choice
            .message
            .tool_calls
            .as_deref()
            .map(Self::convert_tool_calls);

        Ok(ChatResponseWithTools {
            content: choice.message.content,
            function_calls,
            model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}
