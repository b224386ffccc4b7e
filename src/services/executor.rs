// ABOUTME: Executes caller-supplied SQL verbatim against the database behind a project
// ABOUTME: Returns every row as a JSON object keyed by column name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use sqlx::Executor;
use tracing::{debug, instrument};

use super::datasources::DatasourceRegistry;
use crate::database_plugins::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::gateway::{row_to_json, ConnectionGateway, Row};

/// Ad-hoc query execution
///
/// SQL is sent through the simple query protocol, unmodified and without a
/// row cap. Statements may contain several commands; rows from all of them
/// are returned in order.
pub struct QueryExecutor<DB = crate::database_plugins::factory::Database> {
    registry: DatasourceRegistry<DB>,
    gateway: ConnectionGateway,
}

impl<DB: DatabaseProvider> QueryExecutor<DB> {
    /// Create an executor resolving projects through `registry`
    #[must_use]
    pub const fn new(registry: DatasourceRegistry<DB>, gateway: ConnectionGateway) -> Self {
        Self { registry, gateway }
    }

    /// Run `sql` and return its rows
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown project, a connection error if
    /// the endpoint is unreachable, or an execution error if the statement fails
    #[instrument(skip(self, sql), fields(sql_len = sql.len()))]
    pub async fn execute(&self, project_id: &str, sql: &str) -> AppResult<Vec<Row>> {
        let profile = self.registry.connection_profile(project_id).await?;
        let sql = sql.to_owned();

        let rows = self
            .gateway
            .with_connection(&profile, move |mut conn| async move {
                let rows = (&mut *conn)
                    .fetch_all(sqlx::raw_sql(&sql))
                    .await
                    .map_err(|e| AppError::execution(format!("Query failed: {e}")).with_source(e))?;
                Ok(rows.iter().map(row_to_json).collect::<Vec<Row>>())
            })
            .await?;

        debug!(rows = rows.len(), "Query executed");
        Ok(rows)
    }
}
