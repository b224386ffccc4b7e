// ABOUTME: Query commands for vizquery-cli
// ABOUTME: Lists tables, executes SQL, and runs the question-to-chart flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use vizquery::errors::AppResult;
use vizquery::models::ChartKind;
use vizquery::resources::CoreResources;

use crate::helpers::display::print_json;

/// Print the base tables of `schema`
pub async fn tables(resources: &CoreResources, project_id: &str, schema: &str) -> AppResult<()> {
    let tables = resources
        .introspector()
        .list_tables(project_id, Some(schema))
        .await?;
    print_json(&tables)
}

/// Run SQL and print the rows
pub async fn execute(resources: &CoreResources, project_id: &str, sql: &str) -> AppResult<()> {
    print_json(&resources.executor().execute(project_id, sql).await?)
}

/// Answer a question and print SQL, rows, and chart
pub async fn ask(
    resources: &CoreResources,
    project_id: &str,
    question: &str,
    chart: ChartKind,
) -> AppResult<()> {
    let insight = resources
        .insights()?
        .ask(project_id, question, chart)
        .await?;
    print_json(&insight)
}
