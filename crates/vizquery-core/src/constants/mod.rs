// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pool limits, vault parameters, tool names, and environment variable names

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat namespace.

/// Per-operation connection pool limits for external databases
pub mod gateway {
    /// Maximum concurrent connections per pool
    pub const MAX_CONNECTIONS: u32 = 20;
    /// Idle connection timeout in seconds
    pub const IDLE_TIMEOUT_SECS: u64 = 30;
    /// Connection-establish timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 2;
    /// Connection is recycled after this many uses
    pub const MAX_USES: u32 = 7_500;
    /// Port used when a datasource has no port stored
    pub const DEFAULT_PORT: u16 = 5432;
    /// Schema introspected when the caller names none
    pub const DEFAULT_SCHEMA: &str = "public";
    /// Message returned by a successful liveness probe
    pub const CONNECTION_OK_MESSAGE: &str = "Successfully connected to PostgreSQL";
}

/// Credential vault parameters
pub mod vault {
    /// Fixed scrypt salt; existing stored tokens were derived with it
    pub const KEY_SALT: &[u8] = b"salt";
    /// scrypt cost parameter as log2(N)
    pub const SCRYPT_LOG_N: u8 = 14;
    /// scrypt block size
    pub const SCRYPT_R: u32 = 8;
    /// scrypt parallelism
    pub const SCRYPT_P: u32 = 1;
    /// Derived key length (AES-256)
    pub const KEY_LEN: usize = 32;
    /// CBC initialization vector length
    pub const IV_LEN: usize = 16;
    /// Separator between the IV and ciphertext segments of a token
    pub const TOKEN_SEPARATOR: char = ':';
}

/// Language model tool names
pub mod tools {
    /// The single tool offered to the model during chart synthesis
    pub const GENERATE_GRAPH_DATA: &str = "generate_graph_data";
}

/// Registry table names
pub mod tables {
    /// Datasource profiles
    pub const DATASOURCE: &str = "datasource";
    /// Chart configurations referencing a datasource
    pub const CHART_INFO: &str = "chart_info";
}

/// Environment variable names
pub mod env_config {
    /// Secret the vault key is derived from
    pub const ENCRYPTION_SECRET: &str = "ENCRYPTION_SECRET";
    /// Registry database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Registry pool size
    pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
    /// Gateway pool size override
    pub const GATEWAY_MAX_CONNECTIONS: &str = "GATEWAY_MAX_CONNECTIONS";
    /// Gateway idle timeout override
    pub const GATEWAY_IDLE_TIMEOUT_SECS: &str = "GATEWAY_IDLE_TIMEOUT_SECS";
    /// Gateway connect timeout override
    pub const GATEWAY_CONNECT_TIMEOUT_SECS: &str = "GATEWAY_CONNECT_TIMEOUT_SECS";
    /// Gateway per-pool use budget override
    pub const GATEWAY_MAX_USES: &str = "GATEWAY_MAX_USES";
    /// Gateway TLS mode (disable, prefer, require)
    pub const GATEWAY_SSL_MODE: &str = "GATEWAY_SSL_MODE";
    /// Language model provider selection
    pub const LLM_PROVIDER: &str = "VIZQUERY_LLM_PROVIDER";
    /// Language model name override
    pub const LLM_MODEL: &str = "VIZQUERY_LLM_MODEL";
    /// Anthropic API key
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    /// Legacy name for the Anthropic API key
    pub const CLAUDE_API_KEY: &str = "CLAUDE_API_KEY";
    /// OpenAI-compatible endpoint base URL
    pub const LOCAL_LLM_BASE_URL: &str = "LOCAL_LLM_BASE_URL";
    /// OpenAI-compatible model
    pub const LOCAL_LLM_MODEL: &str = "LOCAL_LLM_MODEL";
    /// OpenAI-compatible API key (optional)
    pub const LOCAL_LLM_API_KEY: &str = "LOCAL_LLM_API_KEY";
}

/// Service identity used by logging
pub mod service_names {
    /// Default service name
    pub const VIZQUERY: &str = "vizquery";
}
