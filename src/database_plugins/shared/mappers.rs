// ABOUTME: Model to SQL row conversion helpers for registry database operations.
// ABOUTME: Generic row parsing for PostgreSQL and SQLite plus sqlx error classification.

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Model ↔ SQL row conversion helpers
//!
//! Generic row parsing shared by the PostgreSQL and SQLite backends. Ids are
//! stored as text in both so the same mapper works for each.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{DatasourceType, StoredDatasource};

/// Convert an sqlx error into an `AppError`
///
/// Unique-constraint violations become conflicts, everything else a database error.
#[must_use]
pub fn map_sqlx_error(error: sqlx::Error, context: &str) -> AppError {
    let is_unique = error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique {
        AppError::conflict(format!("{context}: record already exists")).with_source(error)
    } else {
        AppError::database(context).with_source(error)
    }
}

fn column<R, T>(row: &R, name: &str) -> AppResult<T>
where
    R: sqlx::Row,
    for<'a> &'a str: sqlx::ColumnIndex<R>,
    T: for<'a> sqlx::Decode<'a, R::Database> + sqlx::Type<R::Database>,
{
    row.try_get(name)
        .map_err(|e| AppError::database(format!("Failed to get column '{name}': {e}")))
}

fn uuid_column<R>(row: &R, name: &str) -> AppResult<Uuid>
where
    R: sqlx::Row,
    for<'a> &'a str: sqlx::ColumnIndex<R>,
    String: for<'a> sqlx::Decode<'a, R::Database> + sqlx::Type<R::Database>,
{
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw)
        .map_err(|e| AppError::database(format!("Invalid UUID in column '{name}': {e}")))
}

/// Parse a stored datasource from a database row (database-agnostic)
///
/// # Errors
///
/// Returns an error if a column is missing or holds an unexpected type
pub fn parse_datasource_from_row<R>(row: &R) -> AppResult<StoredDatasource>
where
    R: sqlx::Row,
    for<'a> &'a str: sqlx::ColumnIndex<R>,
    String: for<'a> sqlx::Decode<'a, R::Database> + sqlx::Type<R::Database>,
    bool: for<'a> sqlx::Decode<'a, R::Database> + sqlx::Type<R::Database>,
    DateTime<Utc>: for<'a> sqlx::Decode<'a, R::Database> + sqlx::Type<R::Database>,
{
    let type_str: String = column(row, "type")?;
    let datasource_type: DatasourceType = type_str
        .parse()
        .map_err(|e| AppError::database(format!("Invalid datasource type in row: {e}")))?;

    Ok(StoredDatasource {
        id: uuid_column(row, "id")?,
        user_id: column(row, "user_id")?,
        project_id: column(row, "project_id")?,
        datasource_type,
        host: column(row, "host")?,
        port: column(row, "port")?,
        database_name: column(row, "database_name")?,
        username: column(row, "username")?,
        password: column(row, "password")?,
        is_default: column(row, "is_default")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}
