// ABOUTME: Registry database configuration for SQLite and PostgreSQL connections
// ABOUTME: Parses DATABASE_URL into a typed URL and carries the registry pool size
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::env_config;
use crate::errors::{AppError, AppResult};

/// Default registry pool size
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Type-safe registry database location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// `PostgreSQL` connection
    PostgreSQL {
        /// `PostgreSQL` connection string
        connection_string: String,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::config("DATABASE_URL must not be empty"));
        }
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str.trim_start_matches("//")),
                })
            }
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Ok(Self::PostgreSQL {
                connection_string: s.to_owned(),
            })
        } else {
            // Bare path: treat as SQLite file
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::PostgreSQL { connection_string } => connection_string.clone(),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Check if this is a `SQLite` database
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite { .. } | Self::Memory)
    }

    /// Check if this is a `PostgreSQL` database
    #[must_use]
    pub const fn is_postgresql(&self) -> bool {
        matches!(self, Self::PostgreSQL { .. })
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::Memory
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            // Never print credentials embedded in the connection string
            Self::PostgreSQL { .. } => write!(f, "postgresql://[REDACTED]"),
            other => write!(f, "{}", other.to_connection_string()),
        }
    }
}

/// Registry database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (`SQLite` path or `PostgreSQL` connection string)
    pub url: DatabaseUrl,
    /// Maximum registry pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `DATABASE_MAX_CONNECTIONS` is invalid
    pub fn from_env() -> AppResult<Self> {
        let url = DatabaseUrl::parse_url(
            &env::var(env_config::DATABASE_URL).unwrap_or_else(|_| "sqlite::memory:".to_owned()),
        )?;
        let max_connections = match env::var(env_config::DATABASE_MAX_CONNECTIONS) {
            Ok(value) => value.parse().map_err(|e| {
                AppError::config(format!(
                    "Invalid {} value '{value}': {e}",
                    env_config::DATABASE_MAX_CONNECTIONS
                ))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            url,
            max_connections,
        })
    }
}
