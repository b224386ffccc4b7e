// ABOUTME: Shared database logic for PostgreSQL and SQLite implementations
// ABOUTME: Row mapping, the datasource codec, and transaction guards used by both backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

/// Row ↔ model conversion and sqlx error mapping
pub mod mappers;

/// Vault-backed conversion between stored and decrypted datasources
pub mod encryption;

/// RAII transaction guard
pub mod transactions;
