// ABOUTME: Dynamic connection gateway for tenant PostgreSQL endpoints named at request time
// ABOUTME: Builds a bounded pool per operation, scopes one connection to a closure, and closes the pool

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! # Connection Gateway
//!
//! Every logical operation gets its own pool built from the decrypted
//! datasource. [`ConnectionGateway::with_connection`] acquires one connection,
//! runs the caller's closure on it, returns it, and closes the pool on every
//! exit path. If the caller drops the future midway, the pooled connection is
//! returned by its destructor and the idle timeout reclaims it.

/// Row to JSON conversion by Postgres column type
pub mod values;

use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use tracing::{debug, instrument, warn};

use crate::config::GatewayPoolConfig;
use crate::constants::gateway;
use crate::errors::{AppError, AppResult};
use crate::models::Datasource;

pub use values::{row_to_json, Row};

/// Connection handed to closures passed to [`ConnectionGateway::with_connection`]
pub type GatewayConnection = PoolConnection<Postgres>;

/// Decrypted endpoint coordinates for one tenant database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Endpoint host
    pub host: String,
    /// Endpoint port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Login role
    pub username: String,
    /// Login password
    pub password: String,
}

impl Debug for ConnectionProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ConnectionProfile {
    /// Build a profile from a decrypted datasource
    ///
    /// An empty port means the Postgres default.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the port is not a valid number
    pub fn from_datasource(datasource: &Datasource) -> AppResult<Self> {
        let port = parse_port(&datasource.port)?;
        Ok(Self {
            host: datasource.host.clone(),
            port,
            database: datasource.database_name.clone(),
            username: datasource.username.clone(),
            password: datasource.password.clone(),
        })
    }

    fn connect_options(&self, config: &GatewayPoolConfig) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(config.ssl_mode.to_pg_ssl_mode())
            .application_name(crate::constants::service_names::VIZQUERY)
    }
}

fn parse_port(raw: &str) -> AppResult<u16> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(gateway::DEFAULT_PORT);
    }
    trimmed
        .parse()
        .map_err(|_| AppError::connection(format!("Invalid port '{trimmed}'")))
}

/// Release budget shared by every connection of one pool
///
/// Counts releases pool-wide, not per connection. Each release spends one
/// use; once the budget is spent, released connections are closed instead of
/// returned to the idle set.
#[derive(Debug)]
struct UseBudget {
    remaining: AtomicU32,
}

impl UseBudget {
    const fn new(max_uses: u32) -> Self {
        Self {
            remaining: AtomicU32::new(max_uses),
        }
    }

    /// Spend one use; `true` while the released connection may be kept
    fn spend(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok_and(|before| before > 1)
    }
}

/// Opens per-operation pools against tenant databases
#[derive(Debug, Clone, Default)]
pub struct ConnectionGateway {
    config: GatewayPoolConfig,
}

impl ConnectionGateway {
    /// Create a gateway with the given pool limits
    #[must_use]
    pub const fn new(config: GatewayPoolConfig) -> Self {
        Self { config }
    }

    fn build_pool(&self, profile: &ConnectionProfile) -> PgPool {
        let budget = Arc::new(UseBudget::new(self.config.max_uses));
        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(0)
            .idle_timeout(Some(self.config.idle_timeout))
            .acquire_timeout(self.config.connect_timeout)
            .after_release(move |_conn, _meta| {
                // Returning false closes the connection instead of pooling it
                let keep = budget.spend();
                Box::pin(async move { Ok(keep) })
            })
            .connect_lazy_with(profile.connect_options(&self.config))
    }

    /// Run `op` on one connection from a fresh pool, then close the pool
    ///
    /// ```text
    /// let host = profile.host.clone();
    /// gateway
    ///     .with_connection(&profile, move |mut conn| async move {
    ///         /* use &mut *conn */
    ///         Ok(host)
    ///     })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a connection error if no connection can be established within
    /// the connect timeout; otherwise whatever `op` returns
    #[instrument(
        skip(self, profile, op),
        fields(host = %profile.host, port = profile.port, database = %profile.database)
    )]
    pub async fn with_connection<T, F, Fut>(
        &self,
        profile: &ConnectionProfile,
        op: F,
    ) -> AppResult<T>
    where
        T: Send,
        F: FnOnce(GatewayConnection) -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        let pool = self.build_pool(profile);

        let result = match pool.acquire().await {
            Ok(conn) => {
                debug!("Acquired gateway connection");
                op(conn).await
            }
            Err(e) => {
                warn!(error = %e, "Gateway connection failed");
                Err(AppError::connection(format!(
                    "Could not connect to {}:{}/{}: {e}",
                    profile.host, profile.port, profile.database
                ))
                .with_source(e))
            }
        };

        pool.close().await;
        result
    }

    /// Probe an endpoint with `SELECT 1`
    ///
    /// # Errors
    ///
    /// Returns a connection error if the endpoint is unreachable or rejects the probe
    pub async fn test_connection(&self, profile: &ConnectionProfile) -> AppResult<String> {
        self.with_connection(profile, |mut conn| async move {
            sqlx::query("SELECT 1")
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::connection(format!("Connection probe failed: {e}")).with_source(e)
                })?;
            Ok(gateway::CONNECTION_OK_MESSAGE.to_owned())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::DatasourceType;

    fn datasource(port: &str) -> Datasource {
        Datasource {
            id: Uuid::new_v4(),
            user_id: "u".to_owned(),
            project_id: "p".to_owned(),
            datasource_type: DatasourceType::Postgres,
            host: "db.internal".to_owned(),
            port: port.to_owned(),
            database_name: "analytics".to_owned(),
            username: "reader".to_owned(),
            password: "hunter2".to_owned(),
            is_default: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_port_defaults() {
        let profile = ConnectionProfile::from_datasource(&datasource("")).unwrap();
        assert_eq!(profile.port, 5432);
    }

    #[test]
    fn test_explicit_port() {
        let profile = ConnectionProfile::from_datasource(&datasource(" 6543 ")).unwrap();
        assert_eq!(profile.port, 6543);
    }

    #[test]
    fn test_non_numeric_port_is_connection_error() {
        let err = ConnectionProfile::from_datasource(&datasource("abc")).unwrap_err();
        assert!(err.is(crate::errors::ErrorCode::ConnectionFailed));
    }

    #[test]
    fn test_use_budget_closes_after_max_uses() {
        let budget = UseBudget::new(3);
        assert!(budget.spend());
        assert!(budget.spend());
        assert!(!budget.spend());
        assert!(!budget.spend());
    }

    #[test]
    fn test_use_budget_is_shared_across_connections() {
        let budget = Arc::new(UseBudget::new(2));
        let other = Arc::clone(&budget);
        assert!(budget.spend());
        assert!(!other.spend());
    }

    #[test]
    fn test_profile_debug_redacts_password() {
        let profile = ConnectionProfile::from_datasource(&datasource("5432")).unwrap();
        let rendered = format!("{profile:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
