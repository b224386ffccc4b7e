// ABOUTME: Configuration management module for centralized runtime settings
// ABOUTME: Handles environment configs, registry database, gateway pools, and LLM selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Configuration module
//!
//! - **environment**: `ServerConfig` aggregated from environment variables
//! - **database**: registry database URL and pool size
//! - **gateway**: per-operation pool limits for tenant databases
//! - **types**: shared enums (environment, provider selection, TLS mode)

/// Registry database configuration
pub mod database;
/// Environment and server configuration
pub mod environment;
/// Tenant database pool configuration
pub mod gateway;
/// Core configuration type definitions
pub mod types;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::{LlmConfig, ServerConfig};
pub use gateway::GatewayPoolConfig;
pub use types::{Environment, GatewaySslMode, LlmProviderType};
