// ABOUTME: Integration tests for atomic cascade delete and transaction guard rollback
// ABOUTME: Injects a failing trigger to prove a failed delete leaves no partial state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_database, create_test_registry, new_datasource};
use vizquery::database_plugins::factory::Database;
use vizquery::database_plugins::shared::transactions::SqliteTransactionGuard;
use vizquery::database_plugins::sqlite::SqliteDatabase;
use vizquery::errors::ErrorCode;

fn sqlite(database: &Database) -> &SqliteDatabase {
    match database {
        Database::SQLite(db) => db,
        Database::PostgreSQL(_) => panic!("tests run on SQLite"),
    }
}

#[tokio::test]
async fn test_failed_cascade_rolls_back_everything() {
    let (registry, database) = create_test_registry().await;
    let datasource = registry
        .register(new_datasource("u1", "p1", "a", "5432"))
        .await
        .unwrap();
    registry
        .create_chart_info(&datasource, "Revenue", "bar", "SELECT 1")
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER block_chart_delete BEFORE DELETE ON chart_info \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
    )
    .execute(sqlite(&database).pool())
    .await
    .unwrap();

    let err = registry.delete(datasource.id).await.unwrap_err();
    assert!(err.is(ErrorCode::DatabaseError));
    assert_eq!(err.message, "Failed to delete datasource");
    assert!(std::error::Error::source(&err).is_some());

    assert!(registry.get_by_id(datasource.id).await.is_ok());
    assert_eq!(registry.count_chart_info(datasource.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_guard_commit_persists() {
    let database = create_test_database().await;
    let pool = sqlite(&database).pool();
    sqlx::query("CREATE TABLE guard_probe (v INTEGER)")
        .execute(pool)
        .await
        .unwrap();

    let mut guard = SqliteTransactionGuard::new(pool.begin().await.unwrap());
    sqlx::query("INSERT INTO guard_probe VALUES (1)")
        .execute(guard.executor().unwrap())
        .await
        .unwrap();
    guard.commit().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guard_probe")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_dropped_guard_rolls_back() {
    let database = create_test_database().await;
    let pool = sqlite(&database).pool();
    sqlx::query("CREATE TABLE guard_probe (v INTEGER)")
        .execute(pool)
        .await
        .unwrap();

    {
        let mut guard = SqliteTransactionGuard::new(pool.begin().await.unwrap());
        sqlx::query("INSERT INTO guard_probe VALUES (1)")
            .execute(guard.executor().unwrap())
            .await
            .unwrap();
        assert!(!guard.is_committed());
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guard_probe")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_explicit_rollback_discards_changes() {
    let database = create_test_database().await;
    let pool = sqlite(&database).pool();
    sqlx::query("CREATE TABLE guard_probe (v INTEGER)")
        .execute(pool)
        .await
        .unwrap();

    let mut guard = SqliteTransactionGuard::new(pool.begin().await.unwrap());
    sqlx::query("INSERT INTO guard_probe VALUES (1)")
        .execute(guard.executor().unwrap())
        .await
        .unwrap();
    guard.rollback().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guard_probe")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
