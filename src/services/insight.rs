// ABOUTME: End-to-end question answering from project and question to SQL, rows, and chart
// ABOUTME: Composes introspection, SQL translation, execution, and chart synthesis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use serde::Serialize;
use tracing::{info, instrument};

use super::{ChartSynthesisPipeline, Nl2SqlPipeline, QueryExecutor, SchemaIntrospector};
use crate::database_plugins::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::gateway::Row;
use crate::models::{ChartKind, ChartSpec};

/// Answer to one question
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    /// SQL that was executed
    pub sql: String,
    /// Rows it returned
    pub rows: Vec<Row>,
    /// Chart built from the rows
    pub chart: ChartSpec,
}

/// The primary flow: schema, SQL, rows, chart
pub struct InsightService<DB = crate::database_plugins::factory::Database> {
    introspector: SchemaIntrospector<DB>,
    executor: QueryExecutor<DB>,
    nl2sql: Nl2SqlPipeline,
    charts: ChartSynthesisPipeline,
}

impl<DB: DatabaseProvider> InsightService<DB> {
    /// Assemble the service from its stages
    #[must_use]
    pub const fn new(
        introspector: SchemaIntrospector<DB>,
        executor: QueryExecutor<DB>,
        nl2sql: Nl2SqlPipeline,
        charts: ChartSynthesisPipeline,
    ) -> Self {
        Self {
            introspector,
            executor,
            nl2sql,
            charts,
        }
    }

    /// Answer `question` about the data behind `project_id` as a `kind` chart
    ///
    /// # Errors
    ///
    /// Returns a validation error if the model produces no SQL, otherwise the
    /// first error of any stage
    #[instrument(skip(self, question))]
    pub async fn ask(
        &self,
        project_id: &str,
        question: &str,
        kind: ChartKind,
    ) -> AppResult<Insight> {
        let schema = self.introspector.describe_schema(project_id, None).await?;
        let answer = self.nl2sql.translate(&schema.to_prompt(), question).await?;
        let sql = extract_sql(&answer);
        if sql.is_empty() {
            return Err(AppError::validation("Model returned no SQL"));
        }

        let rows = self.executor.execute(project_id, &sql).await?;
        let chart = self
            .charts
            .synthesize_with_defaults(question, kind, &rows)
            .await?;

        info!(rows = rows.len(), "Insight ready");
        Ok(Insight { sql, rows, chart })
    }
}

/// Info strings models put after an opening fence around SQL
const SQL_FENCE_TAGS: &[&str] = &["sql", "postgresql", "postgres", "pgsql", "psql", "plpgsql"];

fn is_fence_tag(word: &str) -> bool {
    SQL_FENCE_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(word))
}

/// Strip a surrounding markdown code fence from a model answer
///
/// Handles both block fences and one-line fences such as
/// ```` ```sql SELECT 1``` ````.
#[must_use]
pub fn extract_sql(answer: &str) -> String {
    let trimmed = answer.trim();
    let Some(fenced) = trimmed.strip_prefix("```") else {
        return trimmed.to_owned();
    };
    let body = fenced.strip_suffix("```").unwrap_or(fenced);

    let sql = match body.split_once('\n') {
        Some((first, rest)) if first.trim().is_empty() || is_fence_tag(first.trim()) => rest,
        Some(_) => body,
        None => match body.trim_start().split_once(char::is_whitespace) {
            Some((tag, rest)) if is_fence_tag(tag) => rest,
            _ => body,
        },
    };
    sql.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sql_is_trimmed() {
        assert_eq!(extract_sql("  SELECT 1;\n"), "SELECT 1;");
    }

    #[test]
    fn test_fenced_sql_is_unwrapped() {
        assert_eq!(
            extract_sql("```sql\nSELECT * FROM users\nLIMIT 10;\n```"),
            "SELECT * FROM users\nLIMIT 10;"
        );
        assert_eq!(extract_sql("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_one_line_fence_keeps_sql() {
        assert_eq!(extract_sql("```sql SELECT 1```"), "SELECT 1");
        assert_eq!(extract_sql("```sql SELECT * FROM t```"), "SELECT * FROM t");
        assert_eq!(extract_sql("```SELECT 1```"), "SELECT 1");
        assert_eq!(extract_sql("``` SELECT 1 ```"), "SELECT 1");
    }

    #[test]
    fn test_fence_without_tag_keeps_first_line() {
        assert_eq!(extract_sql("```SELECT *\nFROM t\n```"), "SELECT *\nFROM t");
        assert_eq!(extract_sql("```PostgreSQL\nSELECT 3\n```"), "SELECT 3");
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(extract_sql("```sql\nSELECT 2"), "SELECT 2");
    }
}
