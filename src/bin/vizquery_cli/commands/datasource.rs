// ABOUTME: Datasource management commands for vizquery-cli
// ABOUTME: Handles register, list, delete, and test-connection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use tracing::info;
use uuid::Uuid;
use vizquery::errors::AppResult;
use vizquery::models::{DatasourceType, NewDatasource};
use vizquery::resources::CoreResources;

use crate::helpers::display::print_json;

/// Flags of the `register` command
pub struct RegisterArgs {
    pub user_id: String,
    pub project_id: String,
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub is_default: bool,
}

/// Register a datasource and print its secret-free summary
pub async fn register(resources: &CoreResources, args: RegisterArgs) -> AppResult<()> {
    let datasource = resources
        .registry()
        .register(NewDatasource {
            user_id: args.user_id,
            project_id: args.project_id,
            datasource_type: DatasourceType::Postgres,
            host: args.host,
            port: args.port,
            database_name: args.database,
            username: args.username,
            password: args.password,
            is_default: args.is_default,
        })
        .await?;
    info!(datasource_id = %datasource.id, "Datasource registered");
    print_json(&datasource.summary())
}

/// Print a user's datasources
pub async fn list(resources: &CoreResources, user_id: &str) -> AppResult<()> {
    print_json(&resources.registry().list_by_user(user_id).await?)
}

/// Delete a datasource with its charts
pub async fn delete(resources: &CoreResources, id: Uuid) -> AppResult<()> {
    let deleted = resources.registry().delete(id).await?;
    print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
}

/// Probe the database behind a project
pub async fn test_connection(resources: &CoreResources, project_id: &str) -> AppResult<()> {
    let profile = resources.registry().connection_profile(project_id).await?;
    let message = resources.gateway().test_connection(&profile).await?;
    println!("{message}");
    Ok(())
}
