// ABOUTME: PostgreSQL registry backend for production deployments
// ABOUTME: Same schema and semantics as the SQLite backend with native timestamp and boolean types

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! PostgreSQL database implementation

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::shared::mappers::{map_sqlx_error, parse_datasource_from_row};
use super::shared::transactions::PostgresTransactionGuard;
use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{ChartInfo, StoredDatasource};

const DATASOURCE_COLUMNS: &str = "id, user_id, project_id, type, host, port, database_name, \
                                  username, password, is_default, created_at, updated_at";

/// PostgreSQL database implementation
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

#[async_trait]
impl DatabaseProvider for PostgresDatabase {
    async fn new(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to open PostgreSQL registry"))?;

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
                is_default BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
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
                created_at TIMESTAMPTZ NOT NULL
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

        debug!("PostgreSQL registry schema ready");
        Ok(())
    }

    async fn create_datasource(&self, datasource: &StoredDatasource) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO datasource (id, user_id, project_id, type, host, port, database_name,
                                    username, password, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
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
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE id = $1"
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
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE project_id = $1 \
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
            "SELECT {DATASOURCE_COLUMNS} FROM datasource WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
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
            SET project_id = $1, type = $2, host = $3, port = $4, database_name = $5,
                username = $6, password = $7, updated_at = $8
            WHERE id = $9
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
        let mut guard = PostgresTransactionGuard::new(tx);
        let id = id.to_string();

        let outcome: AppResult<u64> = async {
            sqlx::query("DELETE FROM chart_info WHERE datasource_id = $1")
                .bind(&id)
                .execute(guard.executor()?)
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to delete chart info"))?;
            let result = sqlx::query("DELETE FROM datasource WHERE id = $1")
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
                    warn!(datasource_id = %id, error = %rollback_error, "Rollback after failed delete also failed");
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
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
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
        sqlx::query_scalar("SELECT COUNT(*) FROM chart_info WHERE datasource_id = $1")
            .bind(datasource_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count chart info"))
    }
}
