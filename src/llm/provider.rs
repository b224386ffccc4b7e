// ABOUTME: Unified LLM provider selector for runtime provider switching
// ABOUTME: Abstracts over the Anthropic and OpenAI-compatible providers based on configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # LLM Provider Selector
//!
//! Set `VIZQUERY_LLM_PROVIDER`:
//! - `anthropic` (default): requires `ANTHROPIC_API_KEY`
//! - `local`/`ollama`/`vllm`/`localai`: any `OpenAI`-compatible endpoint

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    AnthropicConfig, AnthropicProvider, ChatRequest, ChatResponse, ChatResponseWithTools,
    LlmCapabilities, LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider, Tool,
    ToolChoice,
};
use crate::config::{LlmConfig, LlmProviderType};
use crate::constants::env_config;
use crate::errors::AppError;

/// Unified chat provider that wraps Anthropic or a local LLM
pub enum ChatProvider {
    /// Anthropic Messages API
    Anthropic(AnthropicProvider),
    /// Local LLM provider via `OpenAI`-compatible API (Ollama, vLLM, `LocalAI`)
    Local(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create the provider selected by `config`
    ///
    /// # Errors
    ///
    /// Returns a config error if Anthropic is selected without an API key,
    /// or an internal error if the HTTP client cannot be created
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        info!(
            "Initializing LLM provider: {} (set {} to change)",
            config.provider,
            LlmProviderType::ENV_VAR
        );

        let provider = match config.provider {
            LlmProviderType::Anthropic => {
                let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                    AppError::config(format!(
                        "{} environment variable not set",
                        env_config::ANTHROPIC_API_KEY
                    ))
                })?;
                let mut anthropic = AnthropicConfig::new(api_key);
                if let Some(model) = &config.model {
                    anthropic = anthropic.with_model(model.clone());
                }
                Self::Anthropic(AnthropicProvider::new(anthropic)?)
            }
            LlmProviderType::Local => Self::Local(OpenAiCompatibleProvider::new(
                OpenAiCompatibleConfig::from_llm_config(config),
            )?),
        };

        debug!(
            "Provider {} initialized with model: {}",
            provider.display_name(),
            provider.default_model()
        );
        Ok(provider)
    }

    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Self::Anthropic(p) => p,
            Self::Local(p) => p,
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatProvider")
            .field("provider", &self.name())
            .field("model", &self.default_model())
            .finish()
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.inner().capabilities()
    }

    fn default_model(&self) -> &str {
        self.inner().default_model()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.inner().complete(request).await
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
        tool_choice: ToolChoice,
    ) -> Result<ChatResponseWithTools, AppError> {
        self.inner()
            .complete_with_tools(request, tools, tool_choice)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_requires_key() {
        let err = ChatProvider::from_config(&LlmConfig::default()).unwrap_err();
        assert!(err.message.contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_model_override_applies_to_anthropic() {
        let config = LlmConfig {
            anthropic_api_key: Some("k".to_owned()),
            model: Some("claude-3-haiku-20240307".to_owned()),
            ..LlmConfig::default()
        };
        let provider = ChatProvider::from_config(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.default_model(), "claude-3-haiku-20240307");
    }

    #[test]
    fn test_local_provider_selected() {
        let config = LlmConfig {
            provider: LlmProviderType::Local,
            local_base_url: "http://localhost:11434/v1".to_owned(),
            local_model: "qwen".to_owned(),
            ..LlmConfig::default()
        };
        let provider = ChatProvider::from_config(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_model(), "qwen");
    }
}
