// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, in-memory registry, test vault, and a scripted language model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
//! Shared test utilities for `vizquery`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::Value;
use vizquery::crypto::CredentialVault;
use vizquery::database_plugins::factory::Database;
use vizquery::database_plugins::shared::encryption::DatasourceCodec;
use vizquery::database_plugins::DatabaseProvider;
use vizquery::errors::{AppError, AppResult};
use vizquery::llm::{
    ChatRequest, ChatResponse, ChatResponseWithTools, FunctionCall, LlmCapabilities, LlmProvider,
    Tool, ToolChoice,
};
use vizquery::models::NewDatasource;
use vizquery::services::DatasourceRegistry;

static INIT_LOGGER: Once = Once::new();

/// Secret used by every test vault
pub const TEST_SECRET: &str = "vizquery-test-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Arc<Database> {
    init_test_logging();
    Arc::new(Database::new("sqlite::memory:", 1).await.unwrap())
}

/// Vault keyed from [`TEST_SECRET`]
pub fn test_vault() -> CredentialVault {
    CredentialVault::from_secret(TEST_SECRET).unwrap()
}

/// Registry over a fresh in-memory database
pub async fn create_test_registry() -> (DatasourceRegistry, Arc<Database>) {
    let database = create_test_database().await;
    let registry =
        DatasourceRegistry::new(Arc::clone(&database), DatasourceCodec::new(test_vault()));
    (registry, database)
}

/// Registration request pointing at `host:port`
pub fn new_datasource(user_id: &str, project_id: &str, host: &str, port: &str) -> NewDatasource {
    NewDatasource {
        user_id: user_id.to_owned(),
        project_id: project_id.to_owned(),
        host: host.to_owned(),
        port: port.to_owned(),
        database_name: "analytics".to_owned(),
        username: "reader".to_owned(),
        password: "s3cret!".to_owned(),
        ..NewDatasource::default()
    }
}

/// Registration request for a closed local port
pub fn unreachable_datasource(user_id: &str, project_id: &str) -> NewDatasource {
    new_datasource(user_id, project_id, "127.0.0.1", "1")
}

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain text completion
    Text(String),
    /// Tool call with the given name and arguments
    ToolCall { name: String, args: Value },
    /// Text only, no tool call
    NoToolCall,
    /// Provider failure
    Error(String),
}

/// Request observed by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ChatRequest,
    pub tools: Vec<Tool>,
    pub tool_choice: Option<ToolChoice>,
}

/// Scripted language model
///
/// Replies are consumed in order; running out is a test bug and panics.
pub struct MockLlmProvider {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    capabilities: LlmCapabilities,
}

impl MockLlmProvider {
    pub fn new(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            capabilities: LlmCapabilities::tool_calling(),
        })
    }

    pub fn text_only(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            capabilities: LlmCapabilities::text_only(),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock language model ran out of scripted replies")
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock LLM"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            tools: Vec::new(),
            tool_choice: None,
        });
        match self.next_reply() {
            MockReply::Text(content) => Ok(ChatResponse {
                content,
                model: "mock-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            MockReply::Error(message) => Err(AppError::external_service("Mock", message)),
            other => panic!("unexpected reply for plain completion: {other:?}"),
        }
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
        tool_choice: ToolChoice,
    ) -> AppResult<ChatResponseWithTools> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            tools: tools.to_vec(),
            tool_choice: Some(tool_choice),
        });
        let base = ChatResponseWithTools {
            content: None,
            function_calls: None,
            model: "mock-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        };
        match self.next_reply() {
            MockReply::ToolCall { name, args } => Ok(ChatResponseWithTools {
                function_calls: Some(vec![FunctionCall { name, args }]),
                finish_reason: Some("tool_use".to_owned()),
                ..base
            }),
            MockReply::NoToolCall | MockReply::Text(_) => Ok(ChatResponseWithTools {
                content: Some("I would rather describe it in words.".to_owned()),
                ..base
            }),
            MockReply::Error(message) => Err(AppError::external_service("Mock", message)),
        }
    }
}
