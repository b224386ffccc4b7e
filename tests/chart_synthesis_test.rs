// ABOUTME: Integration tests for chart synthesis through forced tool calls
// ABOUTME: Covers tool-choice forcing, payload validation, and provider capability checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{MockLlmProvider, MockReply};
use serde_json::{json, Map, Value};
use vizquery::errors::ErrorCode;
use vizquery::llm::prompts::chart_format_rules;
use vizquery::llm::{MessageRole, ToolChoice};
use vizquery::models::{ChartKind, ChartSpec};
use vizquery::services::ChartSynthesisPipeline;

fn tool_call(args: Value) -> MockReply {
    MockReply::ToolCall {
        name: "generate_graph_data".to_owned(),
        args,
    }
}

fn bar_payload() -> Value {
    json!({
        "chartType": "bar",
        "chart": {
            "title": "Orders by region",
            "xAxis": "region",
            "yAxis": "orders",
            "data": [{"region": "EU", "orders": 12}, {"region": "US", "orders": 30}]
        }
    })
}

fn sample_data() -> Value {
    json!([{"region": "EU", "orders": 12}, {"region": "US", "orders": 30}])
}

#[tokio::test]
async fn test_synthesize_forces_chart_tool() {
    let llm = MockLlmProvider::new(vec![tool_call(bar_payload())]);
    let pipeline = ChartSynthesisPipeline::new(llm.clone());

    let spec = pipeline
        .synthesize(
            "Orders per region",
            ChartKind::Bar,
            chart_format_rules(ChartKind::Bar),
            &sample_data(),
        )
        .await
        .unwrap();
    assert_eq!(spec.kind(), ChartKind::Bar);
    assert_eq!(spec.title(), "Orders by region");

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(
        call.tool_choice,
        Some(ToolChoice::Function("generate_graph_data".to_owned()))
    );
    assert_eq!(call.tools.len(), 1);
    assert_eq!(
        call.tools[0].function_declarations[0].name,
        "generate_graph_data"
    );
    assert_eq!(call.request.max_tokens, Some(4096));
    assert_eq!(call.request.messages[0].role, MessageRole::System);

    let prompt = &call.request.messages[1].content;
    assert!(prompt.contains("Chart Type Required: bar chart"));
    assert!(prompt.contains("Orders per region"));
    assert!(prompt.contains("\"region\": \"EU\""));
    assert!(prompt.contains("MUST be visualized as a bar chart"));
}

#[tokio::test]
async fn test_pie_and_number_payloads_accepted() {
    let pie = json!({
        "chartType": "pie",
        "chart": {
            "title": "Share",
            "xAxis": "segment",
            "yAxis": "value",
            "data": [
                {"segment": "EU", "value": 12, "color": "#4e79a7"},
                {"segment": "US", "value": 30, "color": "#f28e2b"}
            ]
        }
    });
    let number = json!({
        "chartType": "number",
        "chart": {"title": "Total orders", "xAxis": "", "yAxis": "", "data": 42}
    });
    let llm = MockLlmProvider::new(vec![tool_call(pie), tool_call(number)]);
    let pipeline = ChartSynthesisPipeline::new(llm);

    let spec = pipeline
        .synthesize("Share", ChartKind::Pie, "", &sample_data())
        .await
        .unwrap();
    let ChartSpec::Pie(chart) = spec else {
        panic!("expected a pie chart");
    };
    assert_eq!(chart.data.len(), 2);
    assert_eq!(chart.data[1].color, "#f28e2b");

    let spec = pipeline
        .synthesize("Total", ChartKind::Number, "", &json!([{"count": 42}]))
        .await
        .unwrap();
    let ChartSpec::Number(chart) = spec else {
        panic!("expected a number chart");
    };
    assert_eq!(chart.data.as_i64(), Some(42));
}

#[tokio::test]
async fn test_missing_tool_call_is_validation_error() {
    let llm = MockLlmProvider::new(vec![MockReply::NoToolCall]);
    let err = ChartSynthesisPipeline::new(llm)
        .synthesize("Orders", ChartKind::Bar, "", &sample_data())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert!(err.message.contains("Model did not call generate_graph_data"));
}

#[tokio::test]
async fn test_invalid_payloads_rejected() {
    let unknown_kind = json!({
        "chartType": "scatter",
        "chart": {"title": "x", "xAxis": "a", "yAxis": "b", "data": []}
    });
    let untitled = json!({
        "chartType": "bar",
        "chart": {"xAxis": "region", "yAxis": "orders", "data": []}
    });
    let llm = MockLlmProvider::new(vec![
        tool_call(unknown_kind),
        tool_call(untitled),
        tool_call(Value::Null),
    ]);
    let pipeline = ChartSynthesisPipeline::new(llm);

    for _ in 0..3 {
        let err = pipeline
            .synthesize("Orders", ChartKind::Bar, "", &sample_data())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed, "{err}");
    }
}

#[tokio::test]
async fn test_pie_segment_missing_value_rejected() {
    let pie = json!({
        "chartType": "pie",
        "chart": {
            "title": "Share by region",
            "data": [{"segment": "EU", "color": "#4e79a7"}]
        }
    });
    let llm = MockLlmProvider::new(vec![tool_call(pie)]);
    let err = ChartSynthesisPipeline::new(llm)
        .synthesize("Share by region", ChartKind::Pie, "", &sample_data())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn test_case_variant_chart_type_rejected() {
    let mut payload = bar_payload();
    payload["chartType"] = json!("Bar");
    let mut padded = bar_payload();
    padded["chartType"] = json!(" bar ");
    let llm = MockLlmProvider::new(vec![tool_call(payload), tool_call(padded)]);
    let pipeline = ChartSynthesisPipeline::new(llm);

    for _ in 0..2 {
        let err = pipeline
            .synthesize("Orders", ChartKind::Bar, "", &sample_data())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed, "{err}");
        assert!(err.message.contains("Unknown chartType"));
    }
}

#[tokio::test]
async fn test_kind_mismatch_rejected() {
    let llm = MockLlmProvider::new(vec![tool_call(bar_payload())]);
    let err = ChartSynthesisPipeline::new(llm)
        .synthesize("Orders", ChartKind::Line, "", &sample_data())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert!(err.message.contains("line"));
}

#[tokio::test]
async fn test_text_only_provider_is_config_error() {
    let llm = MockLlmProvider::text_only(Vec::new());
    let err = ChartSynthesisPipeline::new(llm.clone())
        .synthesize("Orders", ChartKind::Bar, "", &sample_data())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let llm = MockLlmProvider::new(vec![MockReply::Error("rate limited".to_owned())]);
    let err = ChartSynthesisPipeline::new(llm)
        .synthesize("Orders", ChartKind::Bar, "", &sample_data())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
}

#[tokio::test]
async fn test_defaults_wrap_rows_as_array() {
    let llm = MockLlmProvider::new(vec![tool_call(bar_payload())]);
    let pipeline = ChartSynthesisPipeline::new(llm.clone());

    let mut row = Map::new();
    row.insert("region".to_owned(), json!("EU"));
    row.insert("orders".to_owned(), json!(12));
    pipeline
        .synthesize_with_defaults("Orders", ChartKind::Bar, &[row])
        .await
        .unwrap();

    let prompt = llm.calls()[0].request.messages[1].content.clone();
    assert!(prompt.contains(chart_format_rules(ChartKind::Bar)));
    assert!(prompt.contains("\"orders\": 12"));
}
