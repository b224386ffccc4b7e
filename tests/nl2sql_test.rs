// ABOUTME: Integration tests for natural-language to SQL translation
// ABOUTME: Uses a scripted language model to inspect prompts and returned text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{MockLlmProvider, MockReply};
use vizquery::errors::ErrorCode;
use vizquery::llm::prompts::SqlPromptStyle;
use vizquery::llm::MessageRole;
use vizquery::services::Nl2SqlPipeline;

const SCHEMA: &str = "Table public.orders(\n  id integer,\n  total numeric,\n)\n";

#[tokio::test]
async fn test_translate_sends_schema_and_question() {
    let llm = MockLlmProvider::new(vec![MockReply::Text(
        "SELECT * FROM orders ORDER BY total DESC LIMIT 5;".to_owned(),
    )]);
    let pipeline = Nl2SqlPipeline::new(llm.clone());

    let sql = pipeline
        .translate(SCHEMA, "What are the five largest orders?")
        .await
        .unwrap();
    assert_eq!(sql, "SELECT * FROM orders ORDER BY total DESC LIMIT 5;");

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    let request = &calls[0].request;
    assert_eq!(request.max_tokens, Some(1024));
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, MessageRole::User);

    let prompt = &request.messages[0].content;
    assert!(prompt.contains(SCHEMA));
    assert!(prompt.contains("\"What are the five largest orders?\""));
    assert!(prompt.contains("1. For SELECT, use * instead of column name"));
}

#[tokio::test]
async fn test_translate_returns_text_unmodified() {
    let fenced = "```sql\nSELECT count(*) FROM orders\n```";
    let llm = MockLlmProvider::new(vec![MockReply::Text(fenced.to_owned())]);
    let sql = Nl2SqlPipeline::new(llm)
        .translate(SCHEMA, "How many orders?")
        .await
        .unwrap();
    assert_eq!(sql, fenced);
}

#[tokio::test]
async fn test_named_columns_style() {
    let llm = MockLlmProvider::new(vec![MockReply::Text("SELECT id FROM orders".to_owned())]);
    let pipeline = Nl2SqlPipeline::new(llm.clone()).with_style(SqlPromptStyle::NamedColumns);
    pipeline.translate(SCHEMA, "Order ids").await.unwrap();

    let prompt = llm.calls()[0].request.messages[0].content.clone();
    assert!(!prompt.contains("use * instead of column name"));
    assert!(prompt.contains("Return the appropriate field names in the data."));
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let llm = MockLlmProvider::new(vec![MockReply::Error("overloaded".to_owned())]);
    let err = Nl2SqlPipeline::new(llm)
        .translate(SCHEMA, "Anything")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert!(err.message.contains("overloaded"));
}
