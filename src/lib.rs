// ABOUTME: Main library entry point for the VizQuery datasource and visualization services
// ABOUTME: Credential vault, datasource registry, connection gateway, and question-to-chart pipelines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![deny(unsafe_code)]

//! # `VizQuery`
//!
//! Registers external PostgreSQL databases on behalf of users, keeps their
//! credentials encrypted at rest, and answers questions about their data as
//! chart-ready payloads.
//!
//! ## Architecture
//!
//! - **Crypto**: credential vault (scrypt-derived key, AES-256-CBC tokens)
//! - **Database plugins**: the registry store on `SQLite` or `PostgreSQL`
//! - **Gateway**: per-operation pools against tenant endpoints
//! - **LLM**: model providers and prompt templates
//! - **Services**: registry, introspection, execution, SQL translation,
//!   chart synthesis, and the end-to-end insight flow
//! - **Resources**: dependency injection from one `ServerConfig`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vizquery::config::ServerConfig;
//! use vizquery::errors::AppResult;
//! use vizquery::models::ChartKind;
//! use vizquery::resources::CoreResources;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = CoreResources::from_config(&config).await?;
//!     let insight = resources
//!         .insights()?
//!         .ask("project-1", "How many orders per month?", ChartKind::Line)
//!         .await?;
//!     println!("{}", insight.sql);
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Credential vault
pub mod crypto;

/// Registry database abstraction with `SQLite` and `PostgreSQL` backends
pub mod database_plugins;

/// Unified error handling with standard error codes
pub mod errors;

/// Dynamic connections to tenant databases
pub mod gateway;

/// LLM provider abstraction and prompt templates
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Datasource, chart info, and chart payload models
pub mod models;

/// Dependency injection container
pub mod resources;

/// Domain service layer
pub mod services;
