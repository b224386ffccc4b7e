// ABOUTME: Schema introspection for tenant databases through the connection gateway
// ABOUTME: Lists base tables and renders column listings as prompt context for SQL generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::datasources::DatasourceRegistry;
use crate::constants::gateway::DEFAULT_SCHEMA;
use crate::database_plugins::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::gateway::ConnectionGateway;

const LIST_TABLES_SQL: &str = r"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
    ORDER BY table_name
";

const LIST_COLUMNS_SQL: &str = r"
    SELECT c.table_name::text, c.column_name::text, c.data_type::text
    FROM information_schema.columns c
    JOIN information_schema.tables t
      ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    WHERE c.table_schema = $1
      AND t.table_type = 'BASE TABLE'
    ORDER BY c.table_name, c.ordinal_position
";

/// One column of a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column name
    pub name: String,
    /// `information_schema` data type
    pub data_type: String,
}

/// One base table and its ordered columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDescription {
    /// Table name
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnDescription>,
}

/// Base tables of one schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDescription {
    /// Schema name
    pub schema: String,
    /// Tables ordered by name
    pub tables: Vec<TableDescription>,
}

impl SchemaDescription {
    /// Group `(table, column, type)` triples, already ordered by table then
    /// ordinal position, into tables
    #[must_use]
    pub fn from_columns(
        schema: impl Into<String>,
        columns: impl IntoIterator<Item = (String, String, String)>,
    ) -> Self {
        let mut tables: Vec<TableDescription> = Vec::new();
        for (table, name, data_type) in columns {
            let column = ColumnDescription { name, data_type };
            match tables.last_mut() {
                Some(last) if last.name == table => last.columns.push(column),
                _ => tables.push(TableDescription {
                    name: table,
                    columns: vec![column],
                }),
            }
        }
        Self {
            schema: schema.into(),
            tables,
        }
    }

    /// Table names in order
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Render as schema context for the SQL prompt
    #[must_use]
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let _ = writeln!(out, "Table {}.{}(", self.schema, table.name);
            for column in &table.columns {
                let _ = writeln!(out, "  {} {},", column.name, column.data_type);
            }
            out.push_str(")\n");
        }
        out
    }
}

/// Schema discovery for the database behind a project
pub struct SchemaIntrospector<DB = crate::database_plugins::factory::Database> {
    registry: DatasourceRegistry<DB>,
    gateway: ConnectionGateway,
}

impl<DB: DatabaseProvider> SchemaIntrospector<DB> {
    /// Create an introspector resolving projects through `registry`
    #[must_use]
    pub const fn new(registry: DatasourceRegistry<DB>, gateway: ConnectionGateway) -> Self {
        Self { registry, gateway }
    }

    /// Base table names in `schema` (default `public`), ascending
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown project, a connection error if
    /// the endpoint is unreachable, or an execution error if the catalog query fails
    #[instrument(skip(self))]
    pub async fn list_tables(
        &self,
        project_id: &str,
        schema: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let profile = self.registry.connection_profile(project_id).await?;
        let schema = schema.unwrap_or(DEFAULT_SCHEMA).to_owned();

        let tables = self
            .gateway
            .with_connection(&profile, move |mut conn| async move {
                sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
                    .bind(schema)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| {
                        AppError::execution(format!("Failed to list tables: {e}")).with_source(e)
                    })
            })
            .await?;

        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Base tables with their columns
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_tables`]
    #[instrument(skip(self))]
    pub async fn describe_schema(
        &self,
        project_id: &str,
        schema: Option<&str>,
    ) -> AppResult<SchemaDescription> {
        let profile = self.registry.connection_profile(project_id).await?;
        let schema = schema.unwrap_or(DEFAULT_SCHEMA).to_owned();
        let bind = schema.clone();

        let columns = self
            .gateway
            .with_connection(&profile, move |mut conn| async move {
                sqlx::query_as::<_, (String, String, String)>(LIST_COLUMNS_SQL)
                    .bind(bind)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| {
                        AppError::execution(format!("Failed to describe schema: {e}"))
                            .with_source(e)
                    })
            })
            .await?;

        Ok(SchemaDescription::from_columns(schema, columns))
    }
}
