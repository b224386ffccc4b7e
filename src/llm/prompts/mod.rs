// ABOUTME: Prompt templates for SQL generation and chart synthesis loaded at compile time
// ABOUTME: Provides the chart system prompt, per-kind formatting rules, and the graph tool schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # Prompts
//!
//! Long prompt bodies live in markdown files next to this module and are
//! embedded at compile time. Templates are deterministic: the same inputs
//! always render the same text.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{FunctionDeclaration, Tool};
use crate::constants::tools;
use crate::models::ChartKind;

/// System prompt for chart synthesis
pub const CHART_SYSTEM_PROMPT: &str = include_str!("chart_system.md");

const NUMBER_RULES: &str = include_str!("chart_number.md");
const LINE_RULES: &str = include_str!("chart_line.md");
const BAR_RULES: &str = include_str!("chart_bar.md");
const PIE_RULES: &str = include_str!("chart_pie.md");

/// Formatting rules sent with every chart request of the given kind
#[must_use]
pub const fn chart_format_rules(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Number => NUMBER_RULES,
        ChartKind::Line => LINE_RULES,
        ChartKind::Bar => BAR_RULES,
        ChartKind::Pie => PIE_RULES,
    }
}

/// The single tool offered during chart synthesis
#[must_use]
pub fn chart_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: tools::GENERATE_GRAPH_DATA.to_owned(),
            description: "Generate structured JSON data for creating charts and graphs."
                .to_owned(),
            parameters: Some(chart_tool_schema()),
        }],
    }
}

/// JSON Schema for the `generate_graph_data` tool input
#[must_use]
pub fn chart_tool_schema() -> Value {
    let kinds: Vec<&str> = ChartKind::ALL.iter().map(ChartKind::as_str).collect();
    json!({
        "type": "object",
        "properties": {
            "chartType": {
                "type": "string",
                "enum": kinds,
                "description": "The type of chart to generate"
            },
            "chart": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "xAxis": { "type": "string" },
                    "yAxis": { "type": "string" },
                    "data": {
                        "oneOf": [
                            { "type": "number" },
                            {
                                "type": "array",
                                "items": { "type": "object", "additionalProperties": true }
                            }
                        ]
                    }
                },
                "required": ["title", "xAxis", "yAxis", "data"]
            }
        },
        "required": ["chartType", "chart"]
    })
}

/// User prompt for one chart synthesis request
#[must_use]
pub fn chart_prompt(question: &str, kind: ChartKind, rules: &str, data: &str) -> String {
    format!(
        "\nChart Type Required: {kind} chart\n\n\
         User Request:\n{question}\n\n\
         Visualization Requirements:\n{rules}\n\n\
         Data to visualize:\n{data}\n\n\
         Important: This data MUST be visualized as a {kind} chart."
    )
}

/// Which SQL generation template to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlPromptStyle {
    /// Ask for `SELECT *` projections
    #[default]
    StarProjection,
    /// Ask for explicit field names, including columns the question mentions
    NamedColumns,
}

const STAR_PROJECTION_REQUIREMENTS: &[&str] = &[
    "For SELECT, use * instead of column name in the SQL statement",
    "Return ONLY the SQL query, nothing else",
    "Ensure it's a valid PostgreSQL query",
    "Use appropriate JOINS when needed",
    "Include proper WHERE clauses for filtering",
    "Add ORDER BY clauses when relevant",
    "Use appropriate aggregations (COUNT, SUM, AVG, etc.)",
    "Include LIMIT clause if result set could be large",
];

const NAMED_COLUMNS_REQUIREMENTS: &[&str] = &[
    "Return ONLY the SQL query, nothing else",
    "Ensure it's a valid PostgreSQL query",
    "Use appropriate JOINS when needed",
    "Include proper WHERE clauses for filtering",
    "Add ORDER BY clauses when relevant",
    "Use appropriate aggregations (COUNT, SUM, AVG, etc.)",
    "Include LIMIT clause if result set could be large",
    "Return the appropriate field names in the data.",
    "If the question mentions text contained in a table column, that column should be part of the response.",
];

/// Prompt asking the model to translate `question` into SQL over `schema`
#[must_use]
pub fn sql_prompt(style: SqlPromptStyle, schema: &str, question: &str) -> String {
    let requirements = match style {
        SqlPromptStyle::StarProjection => STAR_PROJECTION_REQUIREMENTS,
        SqlPromptStyle::NamedColumns => NAMED_COLUMNS_REQUIREMENTS,
    };
    let numbered = requirements
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a SQL expert. Based on this database schema:\n\n\
         {schema}\n\n\
         Generate a SQL query to answer this question: \"{question}\"\n\n\
         Requirements:\n{numbered}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_prompt_star_projection() {
        let prompt = sql_prompt(SqlPromptStyle::StarProjection, "orders(id)", "count orders");
        assert!(prompt.starts_with("You are a SQL expert."));
        assert!(prompt.contains("orders(id)"));
        assert!(prompt.contains("\"count orders\""));
        assert!(prompt.contains("1. For SELECT, use * instead of column name"));
        assert!(prompt.contains("8. Include LIMIT clause"));
    }

    #[test]
    fn test_sql_prompt_named_columns() {
        let prompt = sql_prompt(SqlPromptStyle::NamedColumns, "s", "q");
        assert!(!prompt.contains("use * instead"));
        assert!(prompt.contains("8. Return the appropriate field names"));
        assert!(prompt.contains("9. "));
    }

    #[test]
    fn test_sql_prompt_is_deterministic() {
        let a = sql_prompt(SqlPromptStyle::StarProjection, "s", "q");
        let b = sql_prompt(SqlPromptStyle::StarProjection, "s", "q");
        assert_eq!(a, b);
    }

    #[test]
    fn test_chart_prompt_layout() {
        let prompt = chart_prompt("sales by region", ChartKind::Bar, "RULES", "[1]");
        assert!(prompt.contains("Chart Type Required: bar chart"));
        assert!(prompt.contains("User Request:\nsales by region"));
        assert!(prompt.contains("Visualization Requirements:\nRULES"));
        assert!(prompt.contains("Data to visualize:\n[1]"));
        assert!(prompt.ends_with("MUST be visualized as a bar chart."));
    }

    #[test]
    fn test_tool_schema_lists_every_kind() {
        let schema = chart_tool_schema();
        let kinds = schema["properties"]["chartType"]["enum"].as_array().unwrap();
        assert_eq!(kinds.len(), 4);
        assert_eq!(schema["required"], json!(["chartType", "chart"]));
        assert_eq!(chart_tool().function_declarations[0].name, "generate_graph_data");
    }

    #[test]
    fn test_rules_differ_per_kind() {
        assert!(chart_format_rules(ChartKind::Pie).contains("\"segment\""));
        assert!(chart_format_rules(ChartKind::Line).contains("line chart"));
        assert!(chart_format_rules(ChartKind::Number).contains("\"number\""));
    }
}
