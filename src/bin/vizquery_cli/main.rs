// ABOUTME: VizQuery CLI - command-line access to the datasource registry and query pipelines
// ABOUTME: Registers, lists, and deletes datasources, probes endpoints, runs SQL, and answers questions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors
//!
//! Usage:
//! ```bash
//! # Register a datasource for a project
//! vizquery-cli register --user-id u1 --project-id p1 --host db.internal \
//!     --database analytics --username reader --password secret
//!
//! # List a user's datasources
//! vizquery-cli list --user-id u1
//!
//! # Probe the endpoint behind a project
//! vizquery-cli test-connection p1
//!
//! # List base tables, run SQL, or ask a question
//! vizquery-cli tables p1
//! vizquery-cli query p1 "SELECT count(*) FROM orders"
//! vizquery-cli ask p1 "Orders per month this year" --chart line
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use uuid::Uuid;
use vizquery::config::{DatabaseUrl, ServerConfig};
use vizquery::models::ChartKind;
use vizquery::resources::CoreResources;

#[derive(Parser)]
#[command(
    name = "vizquery-cli",
    about = "VizQuery datasource and query CLI",
    long_about = "Command-line tool for registering tenant databases and turning questions into SQL and charts."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Registry database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new datasource
    Register {
        /// Owning user
        #[arg(long)]
        user_id: String,

        /// Project the datasource serves
        #[arg(long)]
        project_id: String,

        /// Database host
        #[arg(long)]
        host: String,

        /// Database port
        #[arg(long, default_value = "5432")]
        port: String,

        /// Database name
        #[arg(long)]
        database: String,

        /// Login role
        #[arg(long)]
        username: String,

        /// Login password
        #[arg(long, default_value = "")]
        password: String,

        /// Mark as the user's default datasource
        #[arg(long)]
        default: bool,
    },

    /// List a user's datasources, newest first
    List {
        /// Owning user
        #[arg(long)]
        user_id: String,
    },

    /// Delete a datasource and its charts
    Delete {
        /// Datasource id
        id: Uuid,
    },

    /// Probe the database behind a project with SELECT 1
    TestConnection {
        /// Project id
        project_id: String,
    },

    /// List base tables of a schema
    Tables {
        /// Project id
        project_id: String,

        /// Schema name
        #[arg(long, default_value = "public")]
        schema: String,
    },

    /// Run SQL verbatim and print the rows
    Query {
        /// Project id
        project_id: String,

        /// SQL to execute
        sql: String,
    },

    /// Answer a question with SQL, rows, and a chart
    Ask {
        /// Project id
        project_id: String,

        /// Question in natural language
        question: String,

        /// Chart kind (number, bar, line, pie)
        #[arg(long, default_value = "bar", value_parser = parse_chart_kind)]
        chart: ChartKind,
    },
}

fn parse_chart_kind(value: &str) -> std::result::Result<ChartKind, String> {
    value.parse().map_err(|e: vizquery::errors::AppError| e.message)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if cli.verbose {
        config.logging.level = "debug".to_owned();
    }
    if let Some(url) = &cli.database_url {
        config.database.url = DatabaseUrl::parse_url(url)?;
    }
    config.logging.init()?;
    debug!("{}", config.summary());

    let resources = CoreResources::from_config(&config).await?;

    match cli.command {
        Command::Register {
            user_id,
            project_id,
            host,
            port,
            database,
            username,
            password,
            default,
        } => {
            commands::datasource::register(
                &resources,
                commands::datasource::RegisterArgs {
                    user_id,
                    project_id,
                    host,
                    port,
                    database,
                    username,
                    password,
                    is_default: default,
                },
            )
            .await?;
        }
        Command::List { user_id } => commands::datasource::list(&resources, &user_id).await?,
        Command::Delete { id } => commands::datasource::delete(&resources, id).await?,
        Command::TestConnection { project_id } => {
            commands::datasource::test_connection(&resources, &project_id).await?;
        }
        Command::Tables { project_id, schema } => {
            commands::query::tables(&resources, &project_id, &schema).await?;
        }
        Command::Query { project_id, sql } => {
            commands::query::execute(&resources, &project_id, &sql).await?;
        }
        Command::Ask {
            project_id,
            question,
            chart,
        } => commands::query::ask(&resources, &project_id, &question, chart).await?,
    }

    Ok(())
}
