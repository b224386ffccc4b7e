// ABOUTME: Integration tests for the end-to-end question to chart flow
// ABOUTME: Checks stage ordering and failure short-circuits; live flow needs TEST_POSTGRES_URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    create_test_database, new_datasource, test_vault, unreachable_datasource, MockLlmProvider,
    MockReply,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use vizquery::config::{GatewayPoolConfig, GatewaySslMode};
use vizquery::errors::ErrorCode;
use vizquery::gateway::ConnectionGateway;
use vizquery::llm::LlmProvider;
use vizquery::models::{ChartKind, ChartSpec};
use vizquery::resources::CoreResources;

async fn resources_with(llm: Option<Arc<dyn LlmProvider>>) -> CoreResources {
    let gateway = ConnectionGateway::new(GatewayPoolConfig {
        connect_timeout: Duration::from_secs(1),
        ssl_mode: GatewaySslMode::Disable,
        ..GatewayPoolConfig::default()
    });
    CoreResources::new(create_test_database().await, test_vault(), gateway, llm)
}

#[tokio::test]
async fn test_unreachable_datasource_fails_before_model_call() {
    let llm = MockLlmProvider::new(Vec::new());
    let resources = resources_with(Some(llm.clone())).await;
    resources
        .registry()
        .register(unreachable_datasource("u1", "p1"))
        .await
        .unwrap();

    let err = resources
        .insights()
        .unwrap()
        .ask("p1", "How many orders?", ChartKind::Number)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionFailed);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let llm = MockLlmProvider::new(Vec::new());
    let resources = resources_with(Some(llm.clone())).await;
    let err = resources
        .insights()
        .unwrap()
        .ask("nope", "Anything?", ChartKind::Bar)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn test_missing_model_is_config_error() {
    let resources = resources_with(None).await;
    let Err(err) = resources.insights() else {
        panic!("insights should need a language model");
    };
    assert_eq!(err.code, ErrorCode::ConfigError);

    // Registry operations do not need the model
    resources
        .registry()
        .register(new_datasource("u1", "p1", "localhost", "5432"))
        .await
        .unwrap();
    assert_eq!(resources.registry().list_by_user("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_live_question_to_chart() {
    let Ok(url) = std::env::var("TEST_POSTGRES_URL") else {
        eprintln!("TEST_POSTGRES_URL not set; skipping live insight test");
        return;
    };
    let rest = url
        .strip_prefix("postgresql://")
        .or_else(|| url.strip_prefix("postgres://"))
        .unwrap();
    let (credentials, location) = rest.rsplit_once('@').unwrap();
    let (username, password) = credentials.split_once(':').unwrap_or((credentials, ""));
    let (host_port, database) = location.split_once('/').unwrap();
    let (host, port) = host_port.split_once(':').unwrap_or((host_port, ""));

    let pool = PgPool::connect(&url).await.unwrap();
    let table = format!("vq_orders_{}", Uuid::new_v4().simple());
    sqlx::raw_sql(&format!(
        "CREATE TABLE public.{table} (region TEXT, orders INT);
         INSERT INTO public.{table} VALUES ('EU', 12), ('US', 30);"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let chart_args = json!({
        "chartType": "bar",
        "chart": {
            "title": "Orders by region",
            "xAxis": "region",
            "yAxis": "orders",
            "data": [{"region": "EU", "orders": 12}, {"region": "US", "orders": 30}]
        }
    });
    let llm = MockLlmProvider::new(vec![
        MockReply::Text(format!(
            "```sql\nSELECT region, orders FROM public.{table} ORDER BY region\n```"
        )),
        MockReply::ToolCall {
            name: "generate_graph_data".to_owned(),
            args: chart_args,
        },
    ]);
    let resources = resources_with(Some(llm.clone())).await;
    let mut request = new_datasource("live-user", "live-insight", host, port);
    request.database_name = database.split('?').next().unwrap().to_owned();
    request.username = username.to_owned();
    request.password = password.to_owned();
    resources.registry().register(request).await.unwrap();

    let insight = resources
        .insights()
        .unwrap()
        .ask("live-insight", "Orders per region", ChartKind::Bar)
        .await
        .unwrap();

    assert_eq!(
        insight.sql,
        format!("SELECT region, orders FROM public.{table} ORDER BY region")
    );
    assert_eq!(insight.rows.len(), 2);
    assert_eq!(insight.rows[1]["orders"], json!(30));
    assert!(matches!(insight.chart, ChartSpec::Bar(_)));

    let calls = llm.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].request.messages[0].content.contains(&table));

    sqlx::raw_sql(&format!("DROP TABLE public.{table}"))
        .execute(&pool)
        .await
        .unwrap();
}
