// ABOUTME: Domain service layer for datasource management and the question-to-chart pipeline
// ABOUTME: Protocol-agnostic services reused by the CLI and any embedding application
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Domain service layer
//!
//! Control flows leaf-first: the registry resolves and decrypts a datasource,
//! the introspector and executor reach the tenant database through the
//! gateway, and the two model pipelines turn a question into SQL and a
//! result set into a validated chart.

/// Chart synthesis through a forced tool call
pub mod chart_synthesis;

/// Datasource registry: register, resolve, edit, and cascade delete
pub mod datasources;

/// Ad-hoc SQL execution against a tenant database
pub mod executor;

/// End-to-end question answering
pub mod insight;

/// Tenant schema discovery
pub mod introspection;

/// Natural-language to SQL translation
pub mod nl2sql;

pub use chart_synthesis::ChartSynthesisPipeline;
pub use datasources::DatasourceRegistry;
pub use executor::QueryExecutor;
pub use insight::{Insight, InsightService};
pub use introspection::{
    ColumnDescription, SchemaDescription, SchemaIntrospector, TableDescription,
};
pub use nl2sql::Nl2SqlPipeline;
