// ABOUTME: Registry database abstraction for datasource profiles and their dependent charts
// ABOUTME: Plugin architecture with SQLite and PostgreSQL backends behind one trait

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{ChartInfo, StoredDatasource};

/// Database factory selecting a backend from the connection string
pub mod factory;
/// PostgreSQL backend
pub mod postgres;
/// Logic shared by both backends
pub mod shared;
/// SQLite backend
pub mod sqlite;

/// Core registry database abstraction
///
/// Implementations persist rows exactly as given. Connection fields arrive
/// already encrypted; see [`shared::encryption::DatasourceCodec`].
#[async_trait]
pub trait DatabaseProvider: Send + Sync + Clone {
    /// Open a pool against `database_url`
    async fn new(database_url: &str, max_connections: u32) -> AppResult<Self>
    where
        Self: Sized;

    /// Create the registry tables and indexes if they do not exist
    async fn migrate(&self) -> AppResult<()>;

    // ================================
    // Datasources
    // ================================

    /// Insert a datasource row
    ///
    /// A second row for the same `(user_id, project_id)` fails with a conflict.
    async fn create_datasource(&self, datasource: &StoredDatasource) -> AppResult<()>;

    /// Get a datasource by id
    async fn get_datasource(&self, id: Uuid) -> AppResult<Option<StoredDatasource>>;

    /// Get the datasource registered for a project
    async fn get_datasource_by_project(
        &self,
        project_id: &str,
    ) -> AppResult<Option<StoredDatasource>>;

    /// List a user's datasources, newest first
    async fn list_datasources_by_user(&self, user_id: &str) -> AppResult<Vec<StoredDatasource>>;

    /// Overwrite every mutable column of an existing row
    ///
    /// Returns `false` if no row has the given id.
    async fn update_datasource(&self, datasource: &StoredDatasource) -> AppResult<bool>;

    /// Delete a datasource and every chart referencing it in one transaction
    ///
    /// Returns `false` if no datasource row had the id. On failure nothing is deleted.
    async fn delete_datasource_cascade(&self, id: Uuid) -> AppResult<bool>;

    // ================================
    // Chart info
    // ================================

    /// Insert a chart info row
    async fn create_chart_info(&self, chart: &ChartInfo) -> AppResult<()>;

    /// Count charts referencing a datasource
    async fn count_chart_info(&self, datasource_id: Uuid) -> AppResult<i64>;
}
