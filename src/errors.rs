// ABOUTME: Re-exports the unified error types from vizquery-core
// ABOUTME: Keeps `crate::errors` paths stable for every module in the main crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Error types shared across the workspace. See `vizquery_core::errors`.

pub use vizquery_core::errors::{AppError, AppResult, ErrorCode};
