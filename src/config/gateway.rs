// ABOUTME: Pool settings for per-operation connections to tenant PostgreSQL databases
// ABOUTME: Defaults mirror the established gateway limits and can be overridden from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::GatewaySslMode;
use crate::constants::{env_config, gateway};
use crate::errors::{AppError, AppResult};

/// Connection gateway pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayPoolConfig {
    /// Maximum concurrent connections per pool
    pub max_connections: u32,
    /// Idle connections are closed after this long
    pub idle_timeout: Duration,
    /// Connection establishment must finish within this
    pub connect_timeout: Duration,
    /// Releases a pool accepts before it starts closing connections
    pub max_uses: u32,
    /// TLS behavior
    pub ssl_mode: GatewaySslMode,
}

impl Default for GatewayPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: gateway::MAX_CONNECTIONS,
            idle_timeout: Duration::from_secs(gateway::IDLE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(gateway::CONNECT_TIMEOUT_SECS),
            max_uses: gateway::MAX_USES,
            ssl_mode: GatewaySslMode::default(),
        }
    }
}

impl GatewayPoolConfig {
    /// Load gateway configuration from environment (or defaults)
    ///
    /// # Errors
    ///
    /// Returns an error if any override is present but not a valid positive number
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_connections: parse_positive(
                env_config::GATEWAY_MAX_CONNECTIONS,
                defaults.max_connections,
            )?,
            idle_timeout: Duration::from_secs(parse_positive(
                env_config::GATEWAY_IDLE_TIMEOUT_SECS,
                defaults.idle_timeout.as_secs(),
            )?),
            connect_timeout: Duration::from_secs(parse_positive(
                env_config::GATEWAY_CONNECT_TIMEOUT_SECS,
                defaults.connect_timeout.as_secs(),
            )?),
            max_uses: parse_positive(env_config::GATEWAY_MAX_USES, defaults.max_uses)?,
            ssl_mode: env::var(env_config::GATEWAY_SSL_MODE)
                .map(|v| GatewaySslMode::from_str_or_default(&v))
                .unwrap_or(defaults.ssl_mode),
        })
    }
}

fn parse_positive<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}")))?;
    if value == T::default() {
        return Err(AppError::config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}
