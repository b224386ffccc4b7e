// ABOUTME: Datasource models for tenant-registered external database connections
// ABOUTME: Datasource, StoredDatasource, NewDatasource, DatasourceUpdate, DatasourceSummary, ChartInfo
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Supported external database families
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DatasourceType {
    /// PostgreSQL wire protocol endpoint
    #[default]
    #[serde(rename = "postgresql", alias = "postgres")]
    Postgres,
}

impl DatasourceType {
    /// Get string representation for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgresql",
        }
    }
}

impl Display for DatasourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasourceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgres),
            _ => Err(AppError::invalid_input(format!(
                "Unsupported datasource type: {s}"
            ))),
        }
    }
}

/// Decrypted datasource as handed to callers
///
/// Connection fields hold plaintext. An empty field means the caller never
/// supplied it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Datasource {
    /// Immutable identifier assigned at registration
    pub id: Uuid,
    /// Owning tenant user
    pub user_id: String,
    /// Project the datasource is scoped to
    pub project_id: String,
    /// Database family
    #[serde(rename = "type")]
    pub datasource_type: DatasourceType,
    /// Endpoint host
    pub host: String,
    /// Endpoint port as text
    pub port: String,
    /// Database name on the endpoint
    pub database_name: String,
    /// Login role
    pub username: String,
    /// Login password
    #[serde(skip_serializing)]
    pub password: String,
    /// Informational flag, never used for lookup
    pub is_default: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last edit time
    pub updated_at: DateTime<Utc>,
}

impl Debug for Datasource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datasource")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("datasource_type", &self.datasource_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_default", &self.is_default)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Datasource {
    /// Project this datasource into its secret-free list form
    #[must_use]
    pub fn summary(&self) -> DatasourceSummary {
        DatasourceSummary {
            id: self.id,
            project_id: self.project_id.clone(),
            datasource_type: self.datasource_type,
            database: self.database_name.clone(),
        }
    }
}

/// Persisted datasource row
///
/// `host`, `port`, `database_name`, `username` and `password` are vault tokens
/// of the form `hex(iv):hex(ciphertext)`, or empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDatasource {
    /// Row identifier
    pub id: Uuid,
    /// Owning tenant user
    pub user_id: String,
    /// Project scope
    pub project_id: String,
    /// Database family
    pub datasource_type: DatasourceType,
    /// Encrypted host
    pub host: String,
    /// Encrypted port
    pub port: String,
    /// Encrypted database name
    pub database_name: String,
    /// Encrypted login role
    pub username: String,
    /// Encrypted password
    pub password: String,
    /// Informational flag
    pub is_default: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last edit time
    pub updated_at: DateTime<Utc>,
}

/// Registration request for a new datasource
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct NewDatasource {
    /// Owning tenant user
    pub user_id: String,
    /// Project scope
    pub project_id: String,
    /// Database family
    #[serde(rename = "type", default)]
    pub datasource_type: DatasourceType,
    /// Endpoint host
    #[serde(default)]
    pub host: String,
    /// Endpoint port as text
    #[serde(default)]
    pub port: String,
    /// Database name
    #[serde(default)]
    pub database_name: String,
    /// Login role
    #[serde(default)]
    pub username: String,
    /// Login password
    #[serde(default)]
    pub password: String,
    /// Informational flag
    #[serde(default)]
    pub is_default: bool,
}

impl Debug for NewDatasource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDatasource")
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("datasource_type", &self.datasource_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// Full replacement of a datasource's connection fields
#[derive(Clone, Serialize, Deserialize)]
pub struct DatasourceUpdate {
    /// Datasource to overwrite; must exist
    pub id: Uuid,
    /// User whose datasource list is returned after the edit
    pub user_id: String,
    /// New project scope
    pub project_id: String,
    /// New database family
    #[serde(rename = "type", default)]
    pub datasource_type: DatasourceType,
    /// New host
    #[serde(default)]
    pub host: String,
    /// New port
    #[serde(default)]
    pub port: String,
    /// New database name
    #[serde(default)]
    pub database_name: String,
    /// New login role
    #[serde(default)]
    pub username: String,
    /// New password
    #[serde(default)]
    pub password: String,
}

impl Debug for DatasourceUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasourceUpdate")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("host", &self.host)
            .field("database_name", &self.database_name)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Secret-free list projection of a datasource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasourceSummary {
    /// Datasource identifier
    pub id: Uuid,
    /// Project scope
    #[serde(rename = "projectId")]
    pub project_id: String,
    /// Database family
    #[serde(rename = "type")]
    pub datasource_type: DatasourceType,
    /// Decrypted database name, or empty
    pub database: String,
}

/// Saved chart configuration bound to a datasource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartInfo {
    /// Row identifier
    pub id: Uuid,
    /// Datasource the chart queries
    pub datasource_id: Uuid,
    /// Owning tenant user
    pub user_id: String,
    /// Project scope
    pub project_id: String,
    /// Display name
    pub name: String,
    /// Chart kind as text (`number`, `bar`, `line`, `pie`)
    pub chart_type: String,
    /// SQL the chart was generated from
    pub query: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ChartInfo {
    /// Create a chart info row for the given datasource
    #[must_use]
    pub fn new(
        datasource: &Datasource,
        name: impl Into<String>,
        chart_type: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            datasource_id: datasource.id,
            user_id: datasource.user_id.clone(),
            project_id: datasource.project_id.clone(),
            name: name.into(),
            chart_type: chart_type.into(),
            query: query.into(),
            created_at: Utc::now(),
        }
    }
}
