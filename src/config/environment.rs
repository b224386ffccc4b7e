// ABOUTME: Environment configuration management for the VizQuery services
// ABOUTME: Aggregates vault secret, registry database, gateway pool, LLM, and logging settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Environment-based configuration management

use std::env;
use std::fmt::{self, Debug, Formatter};

use tracing::info;

use super::database::DatabaseConfig;
use super::gateway::GatewayPoolConfig;
use super::types::{Environment, LlmProviderType};
use crate::constants::env_config;
use crate::errors::{AppError, AppResult};
use crate::logging::LoggingConfig;

/// Default base URL for an `OpenAI`-compatible local server (Ollama)
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434/v1";

/// Default model for an `OpenAI`-compatible local server
pub const DEFAULT_LOCAL_MODEL: &str = "qwen2.5:14b-instruct";

/// Language model collaborator configuration
#[derive(Clone, Default)]
pub struct LlmConfig {
    /// Which provider to build
    pub provider: LlmProviderType,
    /// Model override applied to the selected provider
    pub model: Option<String>,
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,
    /// `OpenAI`-compatible endpoint base URL
    pub local_base_url: String,
    /// `OpenAI`-compatible default model
    pub local_model: String,
    /// `OpenAI`-compatible API key, if the endpoint requires one
    pub local_api_key: Option<String>,
}

impl Debug for LlmConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("local_base_url", &self.local_base_url)
            .field("local_model", &self.local_model)
            .field(
                "local_api_key",
                &self.local_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl LlmConfig {
    /// Load language model configuration from environment
    ///
    /// `ANTHROPIC_API_KEY` wins over the legacy `CLAUDE_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            provider: LlmProviderType::from_env(),
            model: non_empty_var(env_config::LLM_MODEL),
            anthropic_api_key: non_empty_var(env_config::ANTHROPIC_API_KEY)
                .or_else(|| non_empty_var(env_config::CLAUDE_API_KEY)),
            local_base_url: non_empty_var(env_config::LOCAL_LLM_BASE_URL)
                .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_owned()),
            local_model: non_empty_var(env_config::LOCAL_LLM_MODEL)
                .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_owned()),
            local_api_key: non_empty_var(env_config::LOCAL_LLM_API_KEY),
        }
    }
}

/// Complete runtime configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Secret the credential vault key is derived from
    pub encryption_secret: String,
    /// Registry database
    pub database: DatabaseConfig,
    /// Tenant database pool settings
    pub gateway: GatewayPoolConfig,
    /// Language model collaborator
    pub llm: LlmConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl Debug for ServerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("environment", &self.environment)
            .field("encryption_secret", &"[REDACTED]")
            .field("database", &self.database.url.to_string())
            .field("gateway", &self.gateway)
            .field("llm", &self.llm)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if `ENCRYPTION_SECRET` is missing or any
    /// numeric override fails to parse
    pub fn from_env() -> AppResult<Self> {
        let encryption_secret = env::var(env_config::ENCRYPTION_SECRET)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::config(format!(
                    "{} environment variable not set",
                    env_config::ENCRYPTION_SECRET
                ))
            })?;

        let config = Self {
            environment: Environment::from_str_or_default(
                &env::var("ENVIRONMENT").unwrap_or_default(),
            ),
            encryption_secret,
            database: DatabaseConfig::from_env()?,
            gateway: GatewayPoolConfig::from_env()?,
            llm: LlmConfig::from_env(),
            logging: LoggingConfig::from_env(),
        };

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "VizQuery Configuration:\n\
             - Environment: {}\n\
             - Registry Database: {}\n\
             - Gateway: max={} idle={}s connect={}s max_uses={} ssl={}\n\
             - LLM Provider: {}{}",
            self.environment,
            if self.database.url.is_sqlite() {
                "SQLite"
            } else {
                "PostgreSQL"
            },
            self.gateway.max_connections,
            self.gateway.idle_timeout.as_secs(),
            self.gateway.connect_timeout.as_secs(),
            self.gateway.max_uses,
            self.gateway.ssl_mode,
            self.llm.provider,
            self.llm
                .model
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default(),
        )
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
