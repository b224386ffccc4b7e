// ABOUTME: Core data models for the VizQuery datasource platform
// ABOUTME: Re-exports datasource records, list summaries, chart info rows, and chart payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # Data Models
//!
//! - `Datasource`: decrypted connection profile owned by a user within a project
//! - `StoredDatasource`: the persisted row, every connection field as a vault token
//! - `DatasourceSummary`: list projection that never carries secrets
//! - `ChartInfo`: saved chart configuration that depends on a datasource
//! - `ChartSpec`: validated visualization payload produced by chart synthesis

mod chart;
mod datasource;

// Datasource domain
pub use datasource::{
    ChartInfo, Datasource, DatasourceSummary, DatasourceType, DatasourceUpdate, NewDatasource,
    StoredDatasource,
};

// Chart domain
pub use chart::{ChartKind, ChartSpec, NumberChart, PieChart, PieSlice, SeriesChart};
