// ABOUTME: Re-exports the datasource and chart models from vizquery-core
// ABOUTME: Datasource records, secret-free summaries, chart info rows, and chart payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

pub use vizquery_core::models::{
    ChartInfo, ChartKind, ChartSpec, Datasource, DatasourceSummary, DatasourceType,
    DatasourceUpdate, NewDatasource, NumberChart, PieChart, PieSlice, SeriesChart,
    StoredDatasource,
};
