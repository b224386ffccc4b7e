// ABOUTME: Dependency injection container wiring registry, vault, gateway, and language model
// ABOUTME: Builds every service from one ServerConfig and hands out ready-to-use instances
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Shared resources
//!
//! `CoreResources` is built once per process. The vault key is derived at
//! construction and never changes afterwards; services are cheap to create
//! from it on demand.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::crypto::{shared_vault, CredentialVault};
use crate::database_plugins::factory::Database;
use crate::database_plugins::shared::encryption::DatasourceCodec;
use crate::database_plugins::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::gateway::ConnectionGateway;
use crate::llm::{ChatProvider, LlmProvider};
use crate::services::{
    ChartSynthesisPipeline, DatasourceRegistry, InsightService, Nl2SqlPipeline, QueryExecutor,
    SchemaIntrospector,
};

/// Process-wide service dependencies
#[derive(Clone)]
pub struct CoreResources {
    database: Arc<Database>,
    vault: CredentialVault,
    gateway: ConnectionGateway,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl CoreResources {
    /// Assemble resources from already-built parts
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        vault: CredentialVault,
        gateway: ConnectionGateway,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            database,
            vault,
            gateway,
            llm,
        }
    }

    /// Build everything from configuration
    ///
    /// A language model that fails to initialize is not fatal: registry and
    /// query operations still work, and model-backed operations return a
    /// config error.
    ///
    /// # Errors
    ///
    /// Returns a config error for an empty secret or a bad database URL, or a
    /// database error if the registry cannot be opened or migrated
    pub async fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let vault = shared_vault(&config.encryption_secret)?;
        let database = Database::new(
            &config.database.url.to_connection_string(),
            config.database.max_connections,
        )
        .await?;
        info!(backend = database.backend_info(), "Registry database ready");

        let llm = match ChatProvider::from_config(&config.llm) {
            Ok(provider) => Some(Arc::new(provider) as Arc<dyn LlmProvider>),
            Err(e) => {
                warn!(error = %e, "Language model unavailable");
                None
            }
        };

        Ok(Self::new(
            Arc::new(database),
            vault,
            ConnectionGateway::new(config.gateway.clone()),
            llm,
        ))
    }

    /// Registry database
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Connection gateway
    #[must_use]
    pub const fn gateway(&self) -> &ConnectionGateway {
        &self.gateway
    }

    /// Configured language model
    ///
    /// # Errors
    ///
    /// Returns a config error if no provider is configured
    pub fn llm(&self) -> AppResult<Arc<dyn LlmProvider>> {
        self.llm.clone().ok_or_else(|| {
            AppError::config(
                "No language model configured; set ANTHROPIC_API_KEY or VIZQUERY_LLM_PROVIDER=local",
            )
        })
    }

    /// Datasource registry
    #[must_use]
    pub fn registry(&self) -> DatasourceRegistry {
        DatasourceRegistry::new(
            Arc::clone(&self.database),
            DatasourceCodec::new(self.vault.clone()),
        )
    }

    /// Schema introspector
    #[must_use]
    pub fn introspector(&self) -> SchemaIntrospector {
        SchemaIntrospector::new(self.registry(), self.gateway.clone())
    }

    /// Query executor
    #[must_use]
    pub fn executor(&self) -> QueryExecutor {
        QueryExecutor::new(self.registry(), self.gateway.clone())
    }

    /// Natural-language to SQL pipeline
    ///
    /// # Errors
    ///
    /// Returns a config error if no language model is configured
    pub fn nl2sql(&self) -> AppResult<Nl2SqlPipeline> {
        Ok(Nl2SqlPipeline::new(self.llm()?))
    }

    /// Chart synthesis pipeline
    ///
    /// # Errors
    ///
    /// Returns a config error if no language model is configured
    pub fn charts(&self) -> AppResult<ChartSynthesisPipeline> {
        Ok(ChartSynthesisPipeline::new(self.llm()?))
    }

    /// End-to-end question answering
    ///
    /// # Errors
    ///
    /// Returns a config error if no language model is configured
    pub fn insights(&self) -> AppResult<InsightService> {
        Ok(InsightService::new(
            self.introspector(),
            self.executor(),
            self.nl2sql()?,
            self.charts()?,
        ))
    }
}
