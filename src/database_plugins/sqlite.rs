// ABOUTME: SQLite registry backend for local development and tests
// ABOUTME: Stores datasource profiles and chart info rows with text ids and timestamps

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! SQLite database implementation

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::shared::mappers::{map_sqlx_error, parse_datasource_from_row};
use super::shared::transactions::SqliteTransactionGuard;
use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{ChartInfo, StoredDatasource};

const DATASOURCE_COLUMNS: &str = "id, user_id, project_id, type, host, port, database_name, \
                                  username, password, is_default, created_at, updated_at";

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Underlying pool, for maintenance statements outside the trait
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseProvider for SqliteDatabase {
    async fn new(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let is_memory = database_url.contains(":memory:");
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if is_memory || database_url.contains('?') {
            database_url.to_owned()
        } else {
            format!("{database_url}?mode=rwc")
        };

        // Every connection to :memory: is a separate database, so keep exactly one alive
        let options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = options
            .connect(&connection_options)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to open SQLite registry"))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS datasource (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'postgresql',
                host TEXT NOT NULL DEFAULT '',
                port TEXT NOT NULL DEFAULT '',
                database_name TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL DEFAULT '',
                is_default BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create datasource table"))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_datasource_user_project \
             ON datasource(user_id, project_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create datasource index"))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chart_info (
                id TEXT PRIMARY KEY,
                datasource_id TEXT NOT NULL REFERENCES datasource(id),
                user_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                chart_type TEXT NOT NULL,
                query TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create chart_info table"))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chart_info_datasource ON chart_info(datasource_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create chart_info index"))?;

        debug!("SQLite registry schema ready");
        Ok(())
    }

    async fn create_datasource(&self, datasource: &StoredDatasource) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO datasource (id, user_id, project_id, type, host, port, database_name,
                                    username, password, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(datasource.id.to_string())
        .bind(&datasource.user_id)
        .bind(&datasource.project_id)
        .bind(datasource.datasource_type.as_str())
        .bind(&datasource.host)
        .bind(&datasource.port)
        .bind(&datasource.database_name)
        .bind(&datasource.username)
        .bind(&datasource.password)
        .bind(datasource.is_default)
        .bind(datasource.created_at)
        .bind(datasource.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create datasource"))?;
        Ok(())
    }

    async fn get_datasource(&self, id: Uuid) -> AppResult<Option<StoredDatasource>> {
        let row = sqlx::query(&format!(
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to get datasource"))?;

        row.as_ref().map(parse_datasource_from_row).transpose()
    }

    async fn get_datasource_by_project(
        &self,
        project_id: &str,
    ) -> AppResult<Option<StoredDatasource>> {
        let row = sqlx::query(&format!(
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE project_id = ? \
             ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to get datasource by project"))?;

        row.as_ref().map(parse_datasource_from_row).transpose()
    }

    async fn list_datasources_by_user(&self, user_id: &str) -> AppResult<Vec<StoredDatasource>> {
        let rows = sqlx::query(&format!(
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE user_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to list datasources"))?;

        rows.iter().map(parse_datasource_from_row).collect()
    }

    async fn update_datasource(&self, datasource: &StoredDatasource) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE datasource
            SET project_id = ?, type = ?, host = ?, port = ?, database_name = ?,
                username = ?, password = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&datasource.project_id)
        .bind(datasource.datasource_type.as_str())
        .bind(&datasource.host)
        .bind(&datasource.port)
        .bind(&datasource.database_name)
        .bind(&datasource.username)
        .bind(&datasource.password)
        .bind(datasource.updated_at)
        .bind(datasource.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to update datasource"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_datasource_cascade(&self, id: Uuid) -> AppResult<bool> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to begin delete transaction"))?;
        let mut guard = SqliteTransactionGuard::new(tx);
        let id = id.to_string();

        let outcome: AppResult<u64> = async {
            sqlx::query("DELETE FROM chart_info WHERE datasource_id = ?")
                .bind(&id)
                .execute(guard.executor()?)
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to delete chart info"))?;
            let result = sqlx::query("DELETE FROM datasource WHERE id = ?")
                .bind(&id)
                .execute(guard.executor()?)
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to delete datasource row"))?;
            Ok(result.rows_affected())
        }
        .await;

        match outcome {
            Ok(deleted) => {
                guard.commit().await?;
                Ok(deleted > 0)
            }
            Err(e) => {
                if let Err(rollback_error) = guard.rollback().await {
                    warn!(
                        datasource_id = %id,
                        error = %rollback_error,
                        "Rollback after failed delete also failed"
                    );
                }
                Err(AppError::database("Failed to delete datasource").with_source(e))
            }
        }
    }

    async fn create_chart_info(&self, chart: &ChartInfo) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO chart_info (id, datasource_id, user_id, project_id, name, chart_type,
                                    query, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(chart.id.to_string())
        .bind(chart.datasource_id.to_string())
        .bind(&chart.user_id)
        .bind(&chart.project_id)
        .bind(&chart.name)
        .bind(&chart.chart_type)
        .bind(&chart.query)
        .bind(chart.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create chart info"))?;
        Ok(())
    }

    async fn count_chart_info(&self, datasource_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM chart_info WHERE datasource_id = ?")
            .bind(datasource_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count chart info"))
    }
}
