// ABOUTME: Datasource registry service enforcing per-user project uniqueness
// ABOUTME: Encrypts on write, decrypts on read, and deletes datasources with their charts atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::database_plugins::factory::Database;
use crate::database_plugins::shared::encryption::DatasourceCodec;
use crate::database_plugins::DatabaseProvider;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::gateway::ConnectionProfile;
use crate::models::{ChartInfo, Datasource, DatasourceSummary, DatasourceUpdate, NewDatasource};

/// Datasource registry over a registry database backend
///
/// Callers only ever see decrypted [`Datasource`] values; the backend only
/// ever sees encrypted rows.
pub struct DatasourceRegistry<DB = Database> {
    database: Arc<DB>,
    codec: DatasourceCodec,
}

impl<DB> Clone for DatasourceRegistry<DB> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            codec: self.codec.clone(),
        }
    }
}

impl<DB: DatabaseProvider> DatasourceRegistry<DB> {
    /// Create a registry over `database` encrypting with `codec`
    #[must_use]
    pub const fn new(database: Arc<DB>, codec: DatasourceCodec) -> Self {
        Self { database, codec }
    }

    /// Register a new datasource
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty user or project id, a conflict
    /// error if the user already has a datasource for the project, or a
    /// database error
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, project_id = %request.project_id)
    )]
    pub async fn register(&self, request: NewDatasource) -> AppResult<Datasource> {
        validate_scope(&request.user_id, &request.project_id)?;

        let stored = self
            .codec
            .encode_new(Uuid::new_v4(), &request, Utc::now())?;
        self.database
            .create_datasource(&stored)
            .await
            .map_err(|e| duplicate_project(e, &request.project_id))?;

        info!(datasource_id = %stored.id, "Registered datasource");
        self.codec.decode(stored)
    }

    /// Resolve the datasource of a project
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no datasource serves the project
    pub async fn get_by_project(&self, project_id: &str) -> AppResult<Datasource> {
        let stored = self
            .database
            .get_datasource_by_project(project_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Datasource for project {project_id}"))
                    .with_resource_id(project_id)
            })?;
        self.codec.decode(stored)
    }

    /// Resolve a datasource by id
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the id is unknown
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Datasource> {
        let stored = self.database.get_datasource(id).await?.ok_or_else(|| {
            AppError::not_found(format!("Datasource {id}")).with_resource_id(id.to_string())
        })?;
        self.codec.decode(stored)
    }

    /// Summaries of a user's datasources, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error, or a decode error if a stored database name
    /// cannot be decrypted
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<DatasourceSummary>> {
        self.database
            .list_datasources_by_user(user_id)
            .await?
            .iter()
            .map(|stored| self.codec.summarize(stored))
            .collect()
    }

    /// Replace the connection fields of an existing datasource
    ///
    /// Returns the user's refreshed summary list.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the id is unknown (edit never creates), or
    /// a conflict error if the new project collides with another of the user's
    /// datasources
    #[instrument(skip(self, update), fields(datasource_id = %update.id))]
    pub async fn edit(&self, update: DatasourceUpdate) -> AppResult<Vec<DatasourceSummary>> {
        validate_scope(&update.user_id, &update.project_id)?;

        let existing = self.database.get_datasource(update.id).await?.ok_or_else(|| {
            AppError::not_found(format!("Datasource {}", update.id))
                .with_resource_id(update.id.to_string())
        })?;

        let stored = self.codec.encode_update(&existing, &update, Utc::now())?;
        let updated = self
            .database
            .update_datasource(&stored)
            .await
            .map_err(|e| duplicate_project(e, &update.project_id))?;
        if !updated {
            return Err(AppError::not_found(format!("Datasource {}", update.id))
                .with_resource_id(update.id.to_string()));
        }

        info!("Updated datasource");
        self.list_by_user(&update.user_id).await
    }

    /// Delete a datasource and every chart that references it, atomically
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the id is unknown, or a database error
    /// (`"Failed to delete datasource"`) carrying the cause after rollback
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        if !self.database.delete_datasource_cascade(id).await? {
            return Err(AppError::not_found(format!("Datasource {id}"))
                .with_resource_id(id.to_string()));
        }
        info!("Deleted datasource");
        Ok(true)
    }

    /// Resolve a project into gateway connection coordinates
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown project, or a connection error
    /// if the stored port is not numeric
    pub async fn connection_profile(&self, project_id: &str) -> AppResult<ConnectionProfile> {
        ConnectionProfile::from_datasource(&self.get_by_project(project_id).await?)
    }

    /// Record a chart that depends on `datasource`
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails
    pub async fn create_chart_info(
        &self,
        datasource: &Datasource,
        name: &str,
        chart_type: &str,
        query: &str,
    ) -> AppResult<ChartInfo> {
        let chart = ChartInfo::new(datasource, name, chart_type, query);
        self.database.create_chart_info(&chart).await?;
        Ok(chart)
    }

    /// Number of charts that reference a datasource
    ///
    /// # Errors
    ///
    /// Returns a database error if the count fails
    pub async fn count_chart_info(&self, datasource_id: Uuid) -> AppResult<i64> {
        self.database.count_chart_info(datasource_id).await
    }
}

fn validate_scope(user_id: &str, project_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::validation("user_id must not be empty"));
    }
    if project_id.trim().is_empty() {
        return Err(AppError::validation("project_id must not be empty"));
    }
    Ok(())
}

fn duplicate_project(error: AppError, project_id: &str) -> AppError {
    if error.is(ErrorCode::ResourceAlreadyExists) {
        AppError::conflict(format!(
            "A datasource for project {project_id} already exists for this user"
        ))
        .with_resource_id(project_id)
        .with_source(error)
    } else {
        error
    }
}
