// ABOUTME: Core configuration type definitions for environment and provider selection
// ABOUTME: Contains Environment, LlmProviderType, and GatewaySslMode enums used across config modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgSslMode;

use crate::constants::env_config;

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment (default)
    #[default]
    Development,
    /// Production environment
    Production,
    /// Testing environment for automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Language model provider selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Anthropic Messages API with tool use (default)
    #[default]
    Anthropic,
    /// Any `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`, hosted)
    Local,
}

impl LlmProviderType {
    /// Environment variable for provider selection
    pub const ENV_VAR: &'static str = env_config::LLM_PROVIDER;

    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "local" | "openai" | "ollama" | "vllm" | "localai" => Self::Local,
            _ => Self::Anthropic,
        }
    }

    /// Load from environment variable
    #[must_use]
    pub fn from_env() -> Self {
        env::var(Self::ENV_VAR)
            .map(|s| Self::from_str_or_default(&s))
            .unwrap_or_default()
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// TLS behavior for connections to tenant databases
///
/// None of the modes verify the server certificate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewaySslMode {
    /// Plaintext only
    Disable,
    /// Try TLS, fall back to plaintext (default)
    #[default]
    Prefer,
    /// TLS mandatory
    Require,
}

impl GatewaySslMode {
    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "disable" | "off" | "false" => Self::Disable,
            "require" | "on" | "true" => Self::Require,
            _ => Self::Prefer,
        }
    }

    /// Equivalent sqlx mode
    #[must_use]
    pub const fn to_pg_ssl_mode(self) -> PgSslMode {
        match self {
            Self::Disable => PgSslMode::Disable,
            Self::Prefer => PgSslMode::Prefer,
            Self::Require => PgSslMode::Require,
        }
    }
}

impl Display for GatewaySslMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Disable => write!(f, "disable"),
            Self::Prefer => write!(f, "prefer"),
            Self::Require => write!(f, "require"),
        }
    }
}
